//! Symbol definitions and reel strips

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, MachineResult};

/// Opaque symbol identifier. Only equality is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u8);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Symbol name (e.g., "Cherry", "Seven")
    pub name: String,
    /// Glyph shown by front-ends
    pub glyph: String,
    /// One-letter code used in compact strip notation
    pub code: char,
    /// Relative weight for independent weighted draws
    pub weight: u32,
}

impl SymbolDef {
    pub fn new(
        id: u8,
        name: impl Into<String>,
        glyph: impl Into<String>,
        code: char,
        weight: u32,
    ) -> Self {
        Self {
            id: SymbolId(id),
            name: name.into(),
            glyph: glyph.into(),
            code,
            weight,
        }
    }
}

/// Ordered, closed set of symbols
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    pub symbols: Vec<SymbolDef>,
}

impl SymbolSet {
    pub fn new(symbols: Vec<SymbolDef>) -> Self {
        Self { symbols }
    }

    /// The classic five-symbol fruit set, most common first.
    pub fn classic() -> Self {
        Self::new(vec![
            SymbolDef::new(0, "Cherry", "🍒", 'C', 35),
            SymbolDef::new(1, "Lemon", "🍋", 'L', 30),
            SymbolDef::new(2, "Bell", "🔔", 'B', 18),
            SymbolDef::new(3, "Star", "⭐", 'S', 12),
            SymbolDef::new(4, "Seven", "7", '7', 5),
        ])
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&SymbolDef> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Get symbol by strip code
    pub fn by_code(&self, code: char) -> Option<&SymbolDef> {
        self.symbols.iter().find(|s| s.code == code)
    }

    /// All IDs in definition order
    pub fn ids(&self) -> Vec<SymbolId> {
        self.symbols.iter().map(|s| s.id).collect()
    }

    /// Weights in definition order
    pub fn weights(&self) -> Vec<u32> {
        self.symbols.iter().map(|s| s.weight).collect()
    }

    /// Glyph for an ID, `"?"` if unknown
    pub fn glyph(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.glyph.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Reject empty sets and duplicate IDs or codes.
    pub fn validate(&self) -> MachineResult<()> {
        if self.symbols.is_empty() {
            return Err(MachineError::invalid("symbol set is empty"));
        }
        for (i, sym) in self.symbols.iter().enumerate() {
            for other in &self.symbols[i + 1..] {
                if other.id == sym.id {
                    return Err(MachineError::invalid(format!("duplicate symbol id {}", sym.id)));
                }
                if other.code == sym.code {
                    return Err(MachineError::invalid(format!(
                        "duplicate symbol code '{}'",
                        sym.code
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::classic()
    }
}

/// A physical reel strip. Positions wrap around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelStrip {
    /// Reel index
    pub reel_index: u8,
    /// Symbol IDs in order
    pub symbols: Vec<SymbolId>,
}

impl ReelStrip {
    /// Create a new reel strip
    pub fn new(reel_index: u8, symbols: Vec<SymbolId>) -> Self {
        Self { reel_index, symbols }
    }

    /// Build a strip from compact notation, one symbol code per character.
    /// Whitespace is ignored.
    pub fn parse(reel_index: u8, notation: &str, set: &SymbolSet) -> MachineResult<Self> {
        let symbols = notation
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                set.by_code(c).map(|s| s.id).ok_or_else(|| {
                    MachineError::invalid(format!(
                        "unknown symbol code '{}' on reel {}",
                        c, reel_index
                    ))
                })
            })
            .collect::<MachineResult<Vec<_>>>()?;

        if symbols.is_empty() {
            return Err(MachineError::invalid(format!("reel strip {} is empty", reel_index)));
        }
        Ok(Self::new(reel_index, symbols))
    }

    /// Render back to compact notation.
    pub fn to_notation(&self, set: &SymbolSet) -> String {
        self.symbols
            .iter()
            .map(|&id| set.get(id).map(|s| s.code).unwrap_or('?'))
            .collect()
    }

    /// Get symbol at position (wraps around). `None` only for an empty strip.
    pub fn symbol_at(&self, position: usize) -> Option<SymbolId> {
        if self.symbols.is_empty() {
            return None;
        }
        Some(self.symbols[position % self.symbols.len()])
    }

    /// Get total strip length
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// How many times a symbol appears on this strip
    pub fn count_of(&self, id: SymbolId) -> usize {
        self.symbols.iter().filter(|&&s| s == id).count()
    }
}
