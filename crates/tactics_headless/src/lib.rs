//! Headless battle runner for scripted play, AI testing and CI verification.
//!
//! This crate drives a [`tactics_core`] battle without any graphics. A
//! controlling process sends JSON commands on stdin and reads events and
//! state on stdout. This enables:
//!
//! - **Scripted play**: A bot or test harness plays the player side
//! - **AI testing**: Built-in [`strategies`] autoplay whole battles
//! - **CI verification**: Catalogs and scenarios are validated before release
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (select, move, attack, tick, ...)
//! - **stdout**: Events and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"query"}' | cargo run -p tactics_headless
//!
//! # Autoplay a scenario and print the board each round
//! cargo run -p tactics_headless -- --scenario crates/tactics_headless/assets/scenarios/river_crossing.ron autoplay --frames
//!
//! # Check the data files
//! cargo run -p tactics_headless -- validate
//! ```

pub mod ascii_visualizer;
pub mod catalog_loader;
pub mod protocol;
pub mod runner;
pub mod strategies;

pub use ascii_visualizer::{render_board, AsciiConfig};
pub use catalog_loader::{default_data_dir, load_scenario, CatalogLoadError, FileCatalogSource};
pub use protocol::{Command, ProtocolError, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use strategies::{autoplay, play_turn, AutoplayReport, Strategy};
