//! Hashed symbol table with external chaining, rendered as an arena of
//! [`Symbol`] records plus index-based buckets instead of the original's
//! pointer-chained buckets (see DESIGN.md).

use crate::expr::Expression;
use crate::line_info::LineId;

/// Default bucket count, matching the original's `NUMBER_OF_SYMBOL_TABLE_HASH_BUCKETS`.
pub const DEFAULT_BUCKET_COUNT: usize = 511;

/// A stable index into the symbol arena. Replaces `Symbol*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// One interned identifier and its current value, if defined.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub key: String,
    pub expression: Expression,
    pub defined: bool,
    references: Vec<LineId>,
}

impl Symbol {
    fn new(key: &str) -> Self {
        Symbol {
            key: key.to_string(),
            expression: Expression::default(),
            defined: false,
            references: Vec::new(),
        }
    }

    /// Idempotent: an `O(n)` scan rejects a line already on the list.
    pub fn add_line_reference(&mut self, line: LineId) {
        if !self.references.contains(&line) {
            self.references.push(line);
        }
    }

    pub fn remove_line_reference(&mut self, line: LineId) {
        self.references.retain(|&l| l != line);
    }

    pub fn line_references(&self) -> &[LineId] {
        &self.references
    }
}

/// Fixed-size bucket array of hash-chained symbols, `hash(s) = fold(c -> 31*h + c, 0)`
/// over the key's bytes, matching the original's `hashString`.
pub struct SymbolTable {
    buckets: Vec<Vec<SymbolId>>,
    symbols: Vec<Symbol>,
}

fn hash_key(key: &str) -> usize {
    let mut hash: usize = 0;
    for &b in key.as_bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(b as usize);
    }
    hash
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_bucket_count(DEFAULT_BUCKET_COUNT)
    }

    pub fn with_bucket_count(bucket_count: usize) -> Self {
        SymbolTable {
            buckets: vec![Vec::new(); bucket_count.max(1)],
            symbols: Vec::new(),
        }
    }

    fn bucket_index(&self, key: &str) -> usize {
        hash_key(key) % self.buckets.len()
    }

    /// Allocates a new symbol and prepends it to its bucket. Never checks for
    /// duplicates; callers that need uniqueness must `find` first.
    pub fn add(&mut self, key: &str) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol::new(key));
        let bucket = self.bucket_index(key);
        self.buckets[bucket].insert(0, id);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    pub fn find(&self, key: &str) -> Option<SymbolId> {
        self.find_sized(key, key.len())
    }

    /// `strncmp`-style prefix comparison: matches if the first `len` bytes of
    /// a bucket entry's key equal the first `len` bytes of `key`. Callers are
    /// responsible for supplying the exact token length; a longer stored key
    /// sharing the same prefix will still match, mirroring the original.
    pub fn find_sized(&self, key: &str, len: usize) -> Option<SymbolId> {
        if key.len() < len {
            return None;
        }
        let needle = &key.as_bytes()[..len];
        let bucket = &self.buckets[self.bucket_index(key)];
        for &id in bucket {
            let candidate = self.symbols[id.0].key.as_bytes();
            if candidate.len() >= len && &candidate[..len] == needle {
                return Some(id);
            }
        }
        None
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Iterates every symbol, bucket by bucket, most-recently-added first
    /// within a bucket (matching `Add`'s prepend order) -- the same
    /// observable order as the original's `EnumStart`/`EnumNext` walk.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter())
            .map(move |&id| (id, &self.symbols[id.0]))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_find_round_trips() {
        let mut table = SymbolTable::new();
        let id = table.add("LOOP");
        assert_eq!(table.find("LOOP"), Some(id));
        assert_eq!(table.find("NOPE"), None);
    }

    #[test]
    fn add_never_deduplicates() {
        let mut table = SymbolTable::new();
        let first = table.add("X");
        let second = table.add("X");
        assert_ne!(first, second);
        // find returns the most recently added entry for a duplicated key.
        assert_eq!(table.find("X"), Some(second));
        assert_eq!(table.symbol_count(), 2);
    }

    #[test]
    fn find_sized_is_a_prefix_match() {
        let mut table = SymbolTable::new();
        let id = table.add("LOOP1");
        assert_eq!(table.find_sized("LOOP1EXTRA", 5), Some(id));
    }

    #[test]
    fn line_reference_add_is_idempotent() {
        let mut table = SymbolTable::new();
        let id = table.add("X");
        let sym = table.get_mut(id);
        sym.add_line_reference(LineId(1));
        sym.add_line_reference(LineId(1));
        assert_eq!(sym.line_references(), &[LineId(1)]);
    }

    #[test]
    fn iter_visits_every_symbol() {
        let mut table = SymbolTable::with_bucket_count(1);
        table.add("A");
        table.add("B");
        table.add("C");
        assert_eq!(table.iter().count(), 3);
    }
}
