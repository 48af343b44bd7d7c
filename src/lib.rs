/*!
 * # ytlearn - admin toolkit for an English-learning video catalog
 *
 * Turns YouTube subtitle files into timestamped transcripts, analyzes them
 * with a generative-language model and manages the stored video analyses and
 * user plans.
 *
 * ## Features
 *
 * - Normalize SRT/WebVTT subtitles into `[MM:SS] text` transcript lines
 * - Look up video metadata through the YouTube Data API
 * - Generate summaries, keywords, slang expressions and discussion questions
 * - Store video analyses and users in a local SQLite document store
 * - Gate admin commands behind a single configured credential pair
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `transcript`: Subtitle normalization
 * - `models`: Video, user and analysis records
 * - `database`: SQLite-backed document store
 * - `providers`: Client implementations for external APIs:
 *   - `providers::youtube`: YouTube Data API client
 *   - `providers::gemini`: Gemini API client
 *   - `providers::mock`: In-process stand-ins for tests
 * - `analysis`: Transcript analysis service and prompts
 * - `auth`: Admin credentials and session
 * - `app_controller`: Admin operations
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod transcript;
pub mod models;
pub mod database;
pub mod providers;
pub mod analysis;
pub mod auth;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::AdminController;
pub use transcript::{normalize, Cue, NormalizedSegment};
pub use errors::{AdminError, AnalysisError, ProviderError, StoreError};
