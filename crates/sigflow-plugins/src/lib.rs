//! Built-in sigflow components.
//!
//! Each submodule exports its classes through [`modules`]; [`ALIASES`] maps
//! the short names used in signal files onto those classes.

pub mod extract;
mod http;
pub mod load;
pub mod transform;

use sigflow_sdk::export::{AliasEntry, ClassExport, ModuleExport};

use extract::{alternative, coingecko, fred};
use load::{file as file_load, sqlite, supabase};
use transform::{fear_greed, key, m2, market_cap};

/// Every built-in module with its exported classes.
pub fn modules() -> Vec<ModuleExport> {
    vec![
        ModuleExport::new(alternative::MODULE)
            .class(ClassExport::extractor::<alternative::AlternativeExtractor>())
            .class(ClassExport::extractor::<alternative::AlternativeGlobalExtractor>()),
        ModuleExport::new(fred::MODULE).class(ClassExport::extractor::<fred::FredExtractor>()),
        ModuleExport::new(coingecko::MODULE)
            .class(ClassExport::extractor::<coingecko::CoinGeckoExtractor>()),
        ModuleExport::new(extract::file::MODULE)
            .class(ClassExport::extractor::<extract::file::JsonFileExtractor>()),
        ModuleExport::new(fear_greed::MODULE)
            .class(ClassExport::transformer::<fear_greed::FearGreedTransformer>()),
        ModuleExport::new(key::MODULE).class(ClassExport::transformer::<key::KeyTransformer>()),
        ModuleExport::new(m2::MODULE).class(ClassExport::transformer::<m2::M2Transformer>()),
        ModuleExport::new(market_cap::MODULE)
            .class(ClassExport::transformer::<market_cap::TotalMarketCapTransformer>()),
        ModuleExport::new(file_load::MODULE).class(ClassExport::loader::<file_load::FileLoader>()),
        ModuleExport::new(supabase::MODULE)
            .class(ClassExport::loader::<supabase::SupabaseLoader>()),
        ModuleExport::new(sqlite::MODULE).class(ClassExport::loader::<sqlite::SqliteLoader>()),
    ]
}

pub const ALIASES: &[AliasEntry] = &[
    AliasEntry {
        alias: "alternative_extractor",
        module: alternative::MODULE,
        class: "AlternativeExtractor",
    },
    AliasEntry {
        alias: "alternative_global_extractor",
        module: alternative::MODULE,
        class: "AlternativeGlobalExtractor",
    },
    AliasEntry {
        alias: "fred_extractor",
        module: fred::MODULE,
        class: "FredExtractor",
    },
    AliasEntry {
        alias: "coingecko_extractor",
        module: coingecko::MODULE,
        class: "CoinGeckoExtractor",
    },
    AliasEntry {
        alias: "json_file_extractor",
        module: extract::file::MODULE,
        class: "JsonFileExtractor",
    },
    AliasEntry {
        alias: "fear_greed_transformer",
        module: fear_greed::MODULE,
        class: "FearGreedTransformer",
    },
    AliasEntry {
        alias: "key_transformer",
        module: key::MODULE,
        class: "KeyTransformer",
    },
    AliasEntry {
        alias: "m2_transformer",
        module: m2::MODULE,
        class: "M2Transformer",
    },
    AliasEntry {
        alias: "total_market_cap_transformer",
        module: market_cap::MODULE,
        class: "TotalMarketCapTransformer",
    },
    AliasEntry {
        alias: "file_loader",
        module: file_load::MODULE,
        class: "FileLoader",
    },
    AliasEntry {
        alias: "supabase_loader",
        module: supabase::MODULE,
        class: "SupabaseLoader",
    },
    AliasEntry {
        alias: "sqlite_loader",
        module: sqlite::MODULE,
        class: "SqliteLoader",
    },
];
