//! JSONL storage for deals
//!
//! Deals are stored in `.dealdates/deals.jsonl` with one JSON object per
//! line. Milestones are kept as flat records inside each deal; resolved
//! dates are never written. Uses file locking for concurrent access safety.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{Deal, DealId};

/// Store for deal data in JSONL format
pub struct DealStore {
    path: PathBuf,
}

impl DealStore {
    /// Creates a new deal store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".dealdates").join("deals.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all deals from the store
    ///
    /// Later lines win, so appended updates supersede earlier copies.
    pub fn read_all(&self) -> Result<BTreeMap<DealId, Deal>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open deal store: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on deal store")?;

        let reader = BufReader::new(&file);
        let mut deals = BTreeMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let deal: Deal = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse deal at line {}", line_num + 1))?;

            deals.insert(deal.id.clone(), deal);
        }

        // Lock is released when file is dropped
        Ok(deals)
    }

    /// Reads a single deal
    pub fn get(&self, id: &DealId) -> Result<Option<Deal>> {
        Ok(self.read_all()?.remove(id))
    }

    /// Writes all deals to the store (full rewrite)
    pub fn write_all(&self, deals: &BTreeMap<DealId, Deal>) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to temp file first
        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on deal store")?;

            let mut writer = BufWriter::new(&file);

            // BTreeMap keeps output sorted by ID
            for deal in deals.values() {
                let line = serde_json::to_string(deal).context("Failed to serialize deal")?;
                writeln!(writer, "{}", line).context("Failed to write deal")?;
            }

            writer.flush().context("Failed to flush deal store")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends a single deal (used for quick adds without full rewrite)
    pub fn append(&self, deal: &Deal) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open deal store: {}", self.path.display()))?;

        // Acquire exclusive lock
        file.lock_exclusive()
            .context("Failed to acquire write lock on deal store")?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(deal).context("Failed to serialize deal")?;
        writeln!(writer, "{}", line).context("Failed to write deal")?;

        writer.flush().context("Failed to flush deal store")?;

        Ok(())
    }

    /// Updates a single deal (reads all, updates, writes all)
    pub fn update(&self, deal: &Deal) -> Result<()> {
        let mut deals = self.read_all()?;
        deals.insert(deal.id.clone(), deal.clone());
        self.write_all(&deals)
    }

    /// Removes a deal by ID
    pub fn remove(&self, id: &DealId) -> Result<bool> {
        let mut deals = self.read_all()?;
        let removed = deals.remove(id).is_some();
        if removed {
            self.write_all(&deals)?;
        }
        Ok(removed)
    }
}
