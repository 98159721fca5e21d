//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//!
//! ```text
//! handler.rs          # 親モジュール（re-export）
//! └── handler/
//!     └── health.rs   # ヘルスチェックハンドラ
//! ```

pub mod health;

pub use health::{HealthState, health_check};
