//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::PortfolioError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::PortfolioError::config(format!($fmt, $($arg)*))
    };
}
