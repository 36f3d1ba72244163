//! # fuzzowl CLI ライブラリ
//!
//! JSON 形式の知識ベース文書を読み込み、ファジィ記述論理のクエリを
//! コマンドラインから実行する

pub mod commands;

pub use commands::*;
