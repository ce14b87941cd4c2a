//! Machine configuration
//!
//! Everything is static data supplied at construction. A configuration can
//! come from the built-in presets or from a JSON/YAML document; either way it
//! goes through [`MachineConfig::build`], which refuses malformed input.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, MachineResult};
use crate::paytable::{PayTable, Payline, PayoutEvaluator, classic_paylines, validate_paylines};
use crate::source::{SymbolSource, WeightedDraw};
use crate::symbols::{ReelStrip, SymbolSet};
use crate::timing::TimingConfig;

/// The five 100-symbol strips of the classic machine, one letter per symbol
/// (C = cherry, L = lemon, B = bell, S = star, 7 = seven).
const CLASSIC_STRIPS: [&str; 5] = [
    "BLLLLLLSLLSCLCCCCCLCLCCLBCLSCBCBCCBCCLSLLCC7SLCCBC\
     LBCCCLLSCCCBCCCLC7CCSCCCLCCBLBCLCCCSCSBBLSCCBL7LLL",
    "CCSCSCLCCCSSBCLL7BLCBLCLLLCLCLBLCCLLCCLCLLCLCCSSC7\
     CCSBLL7CCLBLSBLLBCCCLCSCLCCBCLBLLCBCCCCCCBCSCLBCCC",
    "BLLLLLCCBCLCSCBCLSCSLLCCC7CLBBSCC7LBC7CCLBSCLCCCCL\
     CCCCCLCCLLCBSLCCBLCCCCSLCLLCLCCBCLSSCLBSCLLBLCCBCL",
    "LCBLCLLCCCL7BCCLLLCLCCSCLCSCCCLCLC7LBLLCLCCBBBCBBC\
     SLCLC7LLLCCCSCSCCCBCBSBCCCLCLBSBCLCCCLSSCCCLCCSLLL",
    "BLSLCCCLBCCCCLCCCCCBLCCLCBBCSLC7BCLCCLLCCBCLLLCCCS\
     CLSLLCLC7SCCSBCBSSBLCCLLCLCBCCLLCLLBLLLBL7SCCCSCCC",
];

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    /// Standard 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// Allowed bet per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min_bet: u64,
    pub max_bet: u64,
}

impl BetLimits {
    pub fn clamp(&self, bet: u64) -> u64 {
        bet.clamp(self.min_bet, self.max_bet)
    }
}

impl Default for BetLimits {
    fn default() -> Self {
        Self { min_bet: 1, max_bet: 20 }
    }
}

/// What `reset` restores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub bankroll: u64,
    pub bet_per_line: u64,
    pub active_lines: usize,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            bankroll: 200,
            bet_per_line: 2,
            active_lines: 5,
        }
    }
}

/// How grid symbols are produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Independent weighted draw per cell, using the symbol weights
    Weighted,
    /// One strip per reel in compact letter notation
    Strips { strips: Vec<String> },
}

/// Pays for one symbol, keyed by its strip code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayEntry {
    pub symbol: char,
    pub pays: BTreeMap<u8, u32>,
}

/// Complete, serializable machine description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Name for reference
    #[serde(default = "default_name")]
    pub name: String,
    pub grid: GridSpec,
    pub symbols: SymbolSet,
    pub source: SourceConfig,
    pub paytable: Vec<PayEntry>,
    /// Payline catalog, row per reel, in catalog order
    pub paylines: Vec<Vec<u8>>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub bets: BetLimits,
    #[serde(default)]
    pub defaults: SessionDefaults,
}

fn default_name() -> String {
    "Unnamed Machine".to_string()
}

/// Validated runtime pieces built from a [`MachineConfig`]
#[derive(Debug, Clone)]
pub struct Machine {
    pub grid: GridSpec,
    pub symbols: SymbolSet,
    pub source: SymbolSource,
    pub evaluator: PayoutEvaluator,
    pub paylines: Vec<Payline>,
    pub timing: TimingConfig,
    pub bets: BetLimits,
    pub defaults: SessionDefaults,
}

impl MachineConfig {
    /// Classic 5×3 machine spinning the built-in reel strips
    pub fn classic_strips() -> Self {
        let symbols = SymbolSet::classic();
        let paytable = paytable_entries(&PayTable::classic(), &symbols);
        Self {
            name: "Classic Strips 5x3".into(),
            grid: GridSpec::standard_5x3(),
            symbols,
            source: SourceConfig::Strips {
                strips: CLASSIC_STRIPS.iter().map(|s| s.to_string()).collect(),
            },
            paytable,
            paylines: classic_paylines().into_iter().map(|p| p.rows).collect(),
            timing: TimingConfig::normal(),
            bets: BetLimits::default(),
            defaults: SessionDefaults::default(),
        }
    }

    /// Classic 5×3 machine drawing every cell by weight
    pub fn classic_weighted() -> Self {
        Self {
            name: "Classic Weighted 5x3".into(),
            source: SourceConfig::Weighted,
            timing: TimingConfig::classic_weighted(),
            ..Self::classic_strips()
        }
    }

    /// Parse JSON config
    pub fn from_json(json: &str) -> MachineResult<Self> {
        serde_json::from_str(json).map_err(|e| MachineError::Json(e.to_string()))
    }

    /// Parse YAML config
    pub fn from_yaml(yaml: &str) -> MachineResult<Self> {
        serde_yml::from_str(yaml).map_err(|e| MachineError::Yaml(e.to_string()))
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: impl AsRef<Path>) -> MachineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            Some("json") => Self::from_json(&text),
            other => Err(MachineError::invalid(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> MachineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MachineError::Json(e.to_string()))
    }

    /// Export as YAML
    pub fn to_yaml(&self) -> MachineResult<String> {
        serde_yml::to_string(self).map_err(|e| MachineError::Yaml(e.to_string()))
    }

    /// Check the whole configuration without building it
    pub fn validate(&self) -> MachineResult<()> {
        self.build().map(|_| ())
    }

    /// Validate and produce the runtime machine
    pub fn build(&self) -> MachineResult<Machine> {
        let reels = self.grid.reels as usize;
        let rows = self.grid.rows as usize;
        if reels == 0 || rows == 0 {
            return Err(MachineError::invalid(format!(
                "grid {}x{} has no cells",
                self.grid.reels, self.grid.rows
            )));
        }

        self.symbols.validate()?;

        let source = match &self.source {
            SourceConfig::Weighted => SymbolSource::Weighted(WeightedDraw::from_set(&self.symbols)?),
            SourceConfig::Strips { strips } => {
                let strips = strips
                    .iter()
                    .enumerate()
                    .map(|(i, notation)| ReelStrip::parse(i as u8, notation, &self.symbols))
                    .collect::<MachineResult<Vec<_>>>()?;
                SymbolSource::strips(strips, reels)?
            }
        };

        let mut paytable = PayTable::new();
        for entry in &self.paytable {
            let symbol = self.symbols.by_code(entry.symbol).ok_or_else(|| {
                MachineError::invalid(format!("paytable symbol '{}' is not defined", entry.symbol))
            })?;
            let pays: Vec<(u8, u32)> = entry.pays.iter().map(|(&k, &v)| (k, v)).collect();
            paytable.insert(symbol.id, &pays);
        }
        paytable.validate(reels, &self.symbols)?;

        let paylines: Vec<Payline> = self
            .paylines
            .iter()
            .enumerate()
            .map(|(i, rows)| Payline::new(i + 1, rows.clone()))
            .collect();
        validate_paylines(&paylines, reels, rows)?;

        self.timing.validate(reels)?;

        if self.bets.min_bet == 0 || self.bets.min_bet > self.bets.max_bet {
            return Err(MachineError::invalid(format!(
                "bet limits {}..={} are invalid",
                self.bets.min_bet, self.bets.max_bet
            )));
        }
        let top_multiplier = self
            .paytable
            .iter()
            .flat_map(|entry| entry.pays.values())
            .copied()
            .max()
            .unwrap_or(0);
        let lines = paylines.len() as u64;
        let max_stake = self.bets.max_bet.checked_mul(lines);
        let max_win = self
            .bets
            .max_bet
            .checked_mul(top_multiplier as u64)
            .and_then(|line_win| line_win.checked_mul(lines));
        if max_stake.is_none() || max_win.is_none() {
            return Err(MachineError::invalid(format!(
                "max bet {} over {} lines overflows credit arithmetic",
                self.bets.max_bet, lines
            )));
        }

        let defaults = self.defaults;
        if defaults.active_lines == 0 || defaults.active_lines > paylines.len() {
            return Err(MachineError::invalid(format!(
                "default active lines {} outside 1..={}",
                defaults.active_lines,
                paylines.len()
            )));
        }
        if self.bets.clamp(defaults.bet_per_line) != defaults.bet_per_line {
            return Err(MachineError::invalid(format!(
                "default bet {} outside bet limits",
                defaults.bet_per_line
            )));
        }

        log::debug!(
            "built machine '{}': {}x{}, {} paylines, strip mode {}",
            self.name,
            reels,
            rows,
            paylines.len(),
            source.is_strip_mode()
        );

        Ok(Machine {
            grid: self.grid,
            symbols: self.symbols.clone(),
            source,
            evaluator: PayoutEvaluator::new(paytable),
            paylines,
            timing: self.timing.clone(),
            bets: self.bets,
            defaults,
        })
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::classic_strips()
    }
}

fn paytable_entries(table: &PayTable, set: &SymbolSet) -> Vec<PayEntry> {
    set.symbols
        .iter()
        .filter_map(|def| {
            table.entries_for(def.id).map(|pays| PayEntry {
                symbol: def.code,
                pays: pays.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolId;

    #[test]
    fn test_grid_spec() {
        let grid = GridSpec::standard_5x3();
        assert_eq!(grid.total_positions(), 15);
    }

    #[test]
    fn test_bet_clamp() {
        let bets = BetLimits::default();
        assert_eq!(bets.clamp(0), 1);
        assert_eq!(bets.clamp(7), 7);
        assert_eq!(bets.clamp(500), 20);
    }

    #[test]
    fn test_classic_presets_build() {
        let strips = MachineConfig::classic_strips().build().unwrap();
        assert!(strips.source.is_strip_mode());
        assert_eq!(strips.source.strip_len(0), Some(100));
        assert_eq!(strips.paylines.len(), 9);

        let weighted = MachineConfig::classic_weighted().build().unwrap();
        assert!(!weighted.source.is_strip_mode());
        assert_eq!(weighted.timing, TimingConfig::classic_weighted());
    }

    #[test]
    fn test_classic_strip_contents() {
        let machine = MachineConfig::classic_strips().build().unwrap();
        let SymbolSource::Strips(strips) = &machine.source else {
            panic!("expected strip source");
        };
        let sevens: usize = strips.iter().map(|s| s.count_of(SymbolId(4))).sum();
        let cherries: usize = strips.iter().map(|s| s.count_of(SymbolId(0))).sum();
        assert_eq!(sevens, 15);
        assert_eq!(cherries, 225);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = MachineConfig::classic_strips();
        let json = config.to_json().unwrap();
        let parsed = MachineConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = MachineConfig::classic_weighted();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(MachineConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_yaml_minimal() {
        let yaml = r#"
name: Tiny
grid: { reels: 3, rows: 1 }
symbols:
  - { id: 0, name: Cherry, glyph: "C", code: C, weight: 3 }
  - { id: 1, name: Seven, glyph: "7", code: "7", weight: 1 }
source: { mode: weighted }
paytable:
  - { symbol: "7", pays: { 3: 100 } }
paylines:
  - [0, 0, 0]
bets: { min_bet: 1, max_bet: 5 }
defaults: { bankroll: 50, bet_per_line: 1, active_lines: 1 }
"#;
        let config = MachineConfig::from_yaml(yaml).unwrap();
        let machine = config.build().unwrap();
        assert_eq!(machine.grid.reels, 3);
        assert_eq!(machine.evaluator.paytable().multiplier(SymbolId(1), 3), 100);
        assert_eq!(machine.timing, TimingConfig::normal());
    }

    #[test]
    fn test_invalid_configurations() {
        let mut empty_strip = MachineConfig::classic_strips();
        if let SourceConfig::Strips { strips } = &mut empty_strip.source {
            strips[2].clear();
        }
        assert!(matches!(
            empty_strip.build(),
            Err(MachineError::InvalidConfiguration(_))
        ));

        let mut short_line = MachineConfig::classic_strips();
        short_line.paylines.push(vec![1, 1, 1]);
        assert!(short_line.build().is_err());

        let mut missing_reel = MachineConfig::classic_strips();
        if let SourceConfig::Strips { strips } = &mut missing_reel.source {
            strips.pop();
        }
        assert!(missing_reel.build().is_err());

        let mut bad_bets = MachineConfig::classic_strips();
        bad_bets.bets = BetLimits { min_bet: 10, max_bet: 5 };
        assert!(bad_bets.build().is_err());

        let mut bad_lines = MachineConfig::classic_strips();
        bad_lines.defaults.active_lines = 10;
        assert!(bad_lines.build().is_err());

        let mut zero_weight = MachineConfig::classic_weighted();
        zero_weight.symbols.symbols[3].weight = 0;
        assert!(zero_weight.build().is_err());

        let mut unknown_pay = MachineConfig::classic_strips();
        unknown_pay.paytable.push(PayEntry {
            symbol: 'X',
            pays: BTreeMap::from([(3, 1)]),
        });
        assert!(unknown_pay.build().is_err());
    }

    #[test]
    fn test_overflowing_limits_refused() {
        let mut huge_bet = MachineConfig::classic_strips();
        huge_bet.bets.max_bet = u64::MAX;
        assert!(matches!(
            huge_bet.build(),
            Err(MachineError::InvalidConfiguration(_))
        ));

        // Stake fits but a five-seven win on every line does not
        let mut huge_win = MachineConfig::classic_strips();
        huge_win.bets.max_bet = u64::MAX / 9;
        assert!(huge_win.build().is_err());

        let mut late_stop = MachineConfig::classic_strips();
        late_stop.timing.base_stop_tick = u32::MAX - 2;
        assert!(matches!(
            late_stop.build(),
            Err(MachineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_bad_json_reports_json_error() {
        assert!(matches!(
            MachineConfig::from_json("{ not json"),
            Err(MachineError::Json(_))
        ));
    }
}
