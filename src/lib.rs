//! shellgrok - an exploratory agent that learns to drive a shell.
//!
//! It repeatedly synthesizes a candidate shell command from a learned vocabulary,
//! executes it under a bounded runtime budget, observes the combined output,
//! rewards or penalizes its internal association model based on whether the
//! output was novel or redundant, and continuously adapts its search parameters
//! from the learning-value trend. State is persisted across runs.
//!
//! # Architecture
//!
//! The concurrent learning loop and its data core:
//!
//! - [`core::assoc`] - sparse four-key association store keyed by `(word_i, pos_i, word_k, pos_k)`
//! - [`core::vocab`] - ordered vocabulary of unique words, owning the association map
//! - [`core::obs`] - append-only observation log of tokenized output lines
//! - [`core::similarity`] - proximity-weighted similarity and redundancy judgement
//! - [`core::synth`] - command synthesizer: greedy-picks arguments from a random sample
//! - [`core::exec`] - bounded-runtime child-process executor with signal escalation
//! - [`core::learn`] - learning updater: tokenizes output, judges redundancy, mutates associations
//! - [`core::trend`] - circular-buffer trend tracker feeding the tuner
//! - [`core::pool`] - worker pool driving synthesize -> execute -> learn -> trend-push
//! - [`core::tuner`] - background task adapting command length from the trend verdict
//! - [`persistence`] - load/save the vocabulary, association map, and observation log; `PATH` seeding
//!
//! # Example
//!
//! ```rust
//! use shellgrok::core::vocab::Vocabulary;
//! use shellgrok::core::synth::synthesize;
//! use shellgrok::config::CommandSettings;
//! use rand::SeedableRng;
//!
//! let mut vocab = Vocabulary::new();
//! vocab.append("echo");
//! vocab.append("hi");
//!
//! let settings = CommandSettings::new(2, 100);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let command = synthesize(&vocab, &settings, &mut rng);
//! assert!(command.indices.len() <= 2);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod persistence;

pub use core::engine::Engine;
