//! Data model for a planned sequencing run: samples and their index
//! assignments, index adapter kits, the run's cycle plan, the instrument
//! catalog, and the override-cycles calculator.
#![deny(future_incompatible, nonstandard_style, rust_2018_idioms)]

pub mod index_kit;
pub mod instrument;
pub mod override_cycles;
pub mod run;
pub mod sample;
mod serde_helpers;

pub use index_kit::{IndexKit, IndexMode, IndexPair, IndexSlot, KitError};
pub use instrument::{
    ChemistryType, FlowcellDef, I5Orientation, InstrumentCatalog, InstrumentChannelConfig,
    InstrumentDef,
};
pub use override_cycles::{
    adjust_for_orientation, compute_override_cycles, infer_run_override_cycles,
    recompute_override_cycles, OverrideAssignment, PatternError, ReadPattern,
};
pub use run::{CycleError, RunCycles, SequencingRun};
pub use sample::{Index, IndexRead, Lanes, Sample};
