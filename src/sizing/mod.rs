//! Trade sizing under exchange constraints

pub mod calculator;

pub use calculator::{
    InstrumentMetadata, InstrumentMetadataSource, MaxTradeAmountCalculator,
    StaticInstrumentCatalog,
};
