// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! In-memory package table.
//!
//! A prime-sized array of buckets, each a singly linked chain of boxed
//! nodes, keyed by the FNV-1a hash of the package name. The table grows when
//! an insert would push the load factor over the grow threshold and shrinks
//! when a removal drops it under the shrink threshold. Resizing relinks the
//! existing nodes into a fresh bucket array; records are never copied or
//! moved out of their nodes.

use tracing::{debug, warn};
use upkg_store_core::{PackageRecord, name};

use crate::error::{AllocContext, Result};
use crate::hash::{bucket_index, table_size};

/// Most names returned by [`PackageTable::suggestions`].
pub const MAX_SUGGESTIONS: usize = 10;

/// Sizing policy of a [`PackageTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Requested bucket count at creation, rounded up to a prime.
    pub initial_size: usize,
    /// The table never has fewer buckets than this.
    pub min_size: usize,
    /// Grow before an insert that would exceed this load factor.
    pub grow_threshold: f64,
    /// Shrink after a removal that drops the load factor below this.
    pub shrink_threshold: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_size: 16,
            min_size: 8,
            grow_threshold: 0.75,
            shrink_threshold: 0.25,
        }
    }
}

/// What [`PackageTable::insert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new entry was created.
    Inserted,
    /// An entry with the same name was replaced in place.
    Updated,
}

/// What [`PackageTable::remove`] did.
#[derive(Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Removal {
    /// The entry was unlinked; its record is handed back to the caller.
    Removed(PackageRecord),
    /// No entry had that name.
    NotFound,
}

impl Removal {
    pub fn is_removed(&self) -> bool {
        matches!(self, Removal::Removed(_))
    }

    pub fn into_record(self) -> Option<PackageRecord> {
        match self {
            Removal::Removed(record) => Some(record),
            Removal::NotFound => None,
        }
    }
}

/// Snapshot of the table's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    pub size: usize,
    pub count: usize,
    pub load_factor: f64,
    pub longest_chain: usize,
    pub empty_buckets: usize,
}

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    record: PackageRecord,
    next: Link,
}

/// Hash table owning every stored [`PackageRecord`].
#[derive(Debug)]
pub struct PackageTable {
    buckets: Vec<Link>,
    count: usize,
    config: TableConfig,
}

impl PackageTable {
    /// Create a table with the default sizing policy.
    pub fn new() -> Result<Self> {
        Self::with_config(TableConfig::default())
    }

    /// Create a table with at least `initial_size` buckets.
    pub fn with_capacity(initial_size: usize) -> Result<Self> {
        Self::with_config(TableConfig {
            initial_size,
            ..TableConfig::default()
        })
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        let size = table_size(config.initial_size, config.min_size);
        let buckets = alloc_buckets(size)?;
        debug!(
            "Created package table with {size} buckets (grow above {:.2})",
            config.grow_threshold
        );
        Ok(Self {
            buckets,
            count: 0,
            config,
        })
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.buckets.len() as f64
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Look up a record by name.
    ///
    /// The returned reference points into the table; it cannot outlive the
    /// next mutation.
    pub fn search(&self, name: &str) -> Option<&PackageRecord> {
        if name.is_empty() {
            return None;
        }
        let mut current = self.buckets[self.index_of(name)].as_deref();
        while let Some(node) = current {
            if node.record.name() == name {
                return Some(&node.record);
            }
            current = node.next.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.search(name).is_some()
    }

    /// Store a deep copy of `source`.
    ///
    /// An existing entry with the same name is replaced in place, keeping
    /// its node and bucket. On any error the table is left exactly as it
    /// was and `source` is untouched.
    pub fn insert(&mut self, source: &PackageRecord) -> Result<InsertOutcome> {
        source.validate_name()?;
        let name = source.name();

        let index = self.index_of(name);
        if let Some(existing) = find_mut(self.buckets[index].as_deref_mut(), name) {
            let copy = source
                .try_clone()
                .alloc_context(|| format!("copying record '{name}'"))?;
            *existing = copy;
            debug!("Package '{name}' already in table, updated in place");
            return Ok(InsertOutcome::Updated);
        }

        let copy = source
            .try_clone()
            .alloc_context(|| format!("copying record '{name}'"))?;

        let projected = (self.count + 1) as f64 / self.buckets.len() as f64;
        if projected > self.config.grow_threshold {
            debug!(
                "Load factor {projected:.2} would exceed {:.2}, growing",
                self.config.grow_threshold
            );
            self.resize(self.buckets.len() * 2)?;
        }

        let index = self.index_of(name);
        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Node { record: copy, next }));
        self.count += 1;
        debug!("Package '{name}' added to table ({} entries)", self.count);
        Ok(InsertOutcome::Inserted)
    }

    /// Unlink the entry called `name` and hand its record back.
    ///
    /// Removing a name that isn't stored is not an error.
    pub fn remove(&mut self, name: &str) -> Result<Removal> {
        name::validate(name)?;

        let index = self.index_of(name);
        let Some(node) = unlink(&mut self.buckets[index], name) else {
            debug!("Package '{name}' not in table, nothing to remove");
            return Ok(Removal::NotFound);
        };
        self.count -= 1;
        debug!("Package '{name}' removed from table ({} entries)", self.count);

        if self.count > self.config.min_size && self.load_factor() < self.config.shrink_threshold
        {
            debug!(
                "Load factor {:.2} below {:.2}, shrinking",
                self.load_factor(),
                self.config.shrink_threshold
            );
            // The removal already happened; a failed shrink keeps the old,
            // still valid, bucket array.
            if let Err(e) = self.resize(self.buckets.len() / 2) {
                warn!("Failed to shrink package table: {e}");
            }
        }

        let Node { record, .. } = *node;
        Ok(Removal::Removed(record))
    }

    /// Drop every record, keeping the current bucket array.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            drop_chain(bucket.take());
        }
        self.count = 0;
    }

    /// Records in bucket order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.count,
        }
    }

    /// Names of all stored records, in bucket order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(PackageRecord::name).collect()
    }

    /// Up to [`MAX_SUGGESTIONS`] stored names starting with `prefix`.
    pub fn suggestions(&self, prefix: &str) -> Vec<&str> {
        if prefix.is_empty() {
            return Vec::new();
        }
        self.iter()
            .map(PackageRecord::name)
            .filter(|name| name.starts_with(prefix))
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    pub fn stats(&self) -> TableStats {
        let mut longest_chain = 0;
        let mut empty_buckets = 0;
        for bucket in &self.buckets {
            let mut length = 0;
            let mut current = bucket.as_deref();
            while let Some(node) = current {
                length += 1;
                current = node.next.as_deref();
            }
            if length == 0 {
                empty_buckets += 1;
            }
            longest_chain = longest_chain.max(length);
        }
        TableStats {
            size: self.buckets.len(),
            count: self.count,
            load_factor: self.load_factor(),
            longest_chain,
            empty_buckets,
        }
    }

    fn index_of(&self, name: &str) -> usize {
        bucket_index(name, self.buckets.len())
    }

    /// Move every node into a new bucket array of roughly `requested`
    /// buckets. If the new array can't be allocated nothing changes.
    fn resize(&mut self, requested: usize) -> Result<()> {
        let old_size = self.buckets.len();
        let new_size = table_size(requested, self.config.min_size);
        if new_size == old_size {
            return Ok(());
        }

        let mut buckets = alloc_buckets(new_size)?;
        for mut link in std::mem::take(&mut self.buckets) {
            while let Some(mut node) = link {
                link = node.next.take();
                let index = bucket_index(node.record.name(), new_size);
                node.next = buckets[index].take();
                buckets[index] = Some(node);
            }
        }
        self.buckets = buckets;

        debug!(
            "Resized package table from {old_size} to {new_size} buckets ({} entries)",
            self.count
        );
        Ok(())
    }
}

impl Drop for PackageTable {
    fn drop(&mut self) {
        // Unlink chains iteratively; the default recursive drop of nested
        // boxes is bounded by chain length, not by table size.
        self.clear();
    }
}

impl<'a> IntoIterator for &'a PackageTable {
    type Item = &'a PackageRecord;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the records of a [`PackageTable`].
pub struct Iter<'a> {
    buckets: std::slice::Iter<'a, Link>,
    chain: Option<&'a Node>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a PackageRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain {
                self.chain = node.next.as_deref();
                self.remaining -= 1;
                return Some(&node.record);
            }
            self.chain = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

fn alloc_buckets(size: usize) -> Result<Vec<Link>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(size)
        .alloc_context(|| format!("allocating {size} buckets"))?;
    buckets.resize_with(size, || None);
    Ok(buckets)
}

fn find_mut<'a>(mut current: Option<&'a mut Node>, name: &str) -> Option<&'a mut PackageRecord> {
    while let Some(node) = current {
        if node.record.name() == name {
            return Some(&mut node.record);
        }
        current = node.next.as_deref_mut();
    }
    None
}

fn unlink(mut link: &mut Link, name: &str) -> Option<Box<Node>> {
    while link
        .as_deref()
        .is_some_and(|node| node.record.name() != name)
    {
        link = &mut link.as_mut()?.next;
    }
    let mut node = link.take()?;
    *link = node.next.take();
    Some(node)
}

fn drop_chain(mut link: Link) {
    while let Some(mut node) = link {
        link = node.next.take();
    }
}
