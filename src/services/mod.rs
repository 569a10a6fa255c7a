//! 业务逻辑服务模块
//!
//! 封装页面抓取、附加数据、缓存和聚合逻辑

pub mod ascii_chart;  // 字符走势图
pub mod cache;        // 旁路缓存
pub mod enrichment;   // 个股附加数据
pub mod error;        // 错误类型
pub mod nasdaq;       // 上游页面抓取
pub mod quote_service; // 行情聚合

#[cfg(test)]
pub mod fixtures;

pub use quote_service::QuoteService;
