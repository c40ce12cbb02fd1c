//! # sizewise
//!
//! Resize a decoded image with a choice of algorithms, and recover when the
//! preferred backend cannot handle the request.
//!
//! # Architecture: Resolve, Route, Execute
//!
//! Every request flows through three steps, each a plain function:
//!
//! ```text
//! 1. Resolve   ResizeConfiguration  →  ResolvedConfiguration  (explicit width/height/fit)
//! 2. Route     ResizeMethod         →  Route                  (vector | worker | builtin)
//! 3. Execute   Route + source       →  RgbaImage              (exactly width × height)
//! ```
//!
//! Resolution is pure: longest-edge requests become explicit dimensions before
//! any backend sees them, so backends never deal with sizing intent. Routing is
//! an exhaustive `match`; a new method without a backend does not compile.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Resolver, backend selector and executor with the worker → builtin fallback |
//! | [`imaging`] | Parameter types, dimension math, the three backends and their traits |
//! | [`source`] | Loading rasters and SVGs into a read-only [`source::SourceImage`] |
//! | [`cancel`] | Cancellation tokens; one outstanding request per output |
//! | [`form`] | Option form controller: aspect lock, presets, input validation |
//! | [`loading`] | Busy-indicator state machine with the timer held as data |
//! | [`config`] | `sizewise.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fallback Is Typed, Not Guessed
//!
//! Backends fail with [`imaging::BackendError`]. Only the `OutOfBounds` variant
//! triggers the single retry on the in-process resampler; classification never
//! looks at message text.
//!
//! ## Cancellation Wins
//!
//! A request whose token is cancelled reports `Cancelled`, whatever else the
//! worker returned, and never falls back. The worker waits on its result
//! channel in short slices so a cancelled caller stops waiting promptly.
//!
//! ## One Backend Per Family, Behind a Trait
//!
//! Each family has a small trait ([`imaging::WorkerBackend`],
//! [`imaging::Resampler`], [`imaging::Rasterizer`]). Tests swap in a recording
//! mock and assert on what the pipeline asked for, without decoding images.

pub mod cancel;
pub mod config;
pub mod form;
pub mod imaging;
pub mod loading;
pub mod output;
pub mod pipeline;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;
