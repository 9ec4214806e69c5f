//! textmark - 在文档树中查找并标记文本
//!
//! 模块结构：
//! - config: 匹配规则与会话选项（serde）
//! - pattern: 由检索词合成正则（变音、同义词、通配符、连接符、精度）
//! - dom: 文档树、HTML 解析/序列化、文本单元遍历、子树加载
//! - fragment: 片段收集与缓存
//! - matcher: 单片段/跨片段匹配、区间包裹
//! - session: 对外调用入口 MarkSession
//! - logging: tracing 初始化

pub mod config;
pub mod dom;
pub mod error;
pub mod fragment;
pub mod logging;
pub mod matcher;
pub mod pattern;
pub mod session;

pub use config::{Accuracy, BlockBoundary, MarkOptions, RuleConfig, Synonym, Wildcards};
pub use dom::Document;
pub use error::{MarkError, RangeRejection, Result};
pub use matcher::{EachInfo, FilterInfo, MarkHandler, NoopHandler, RangeSpec, Verdict};
pub use session::{MarkSession, MarkSummary};
