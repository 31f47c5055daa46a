//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `dcr_versions` - Append-only reservation version log (key: linear_id || version)
//! - `xvp_versions` - Append-only trade version log (key: linear_id || version)
//! - `current` - Current version per record (key: kind || linear_id)
//! - `trade_index` - Trade binding index (key: kind || trade_id)
//!
//! Version rows are never overwritten or deleted; superseding a record writes
//! a new version row and moves the `current` pointer in one atomic batch.

use crate::{
    error::{Error, Result},
    types::{DcrRecord, LinearId, RecordKind, TradeId, XvpRecord},
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use std::sync::Arc;

/// Column family names
const CF_DCR: &str = "dcr_versions";
const CF_XVP: &str = "xvp_versions";
const CF_CURRENT: &str = "current";
const CF_TRADES: &str = "trade_index";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for an append-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_DCR, Self::cf_options_versions()),
            ColumnFamilyDescriptor::new(CF_XVP, Self::cf_options_versions()),
            ColumnFamilyDescriptor::new(CF_CURRENT, Self::cf_options_pointers()),
            ColumnFamilyDescriptor::new(CF_TRADES, Self::cf_options_pointers()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_versions() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_pointers() -> Options {
        let mut opts = Options::default();
        // Pointers are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Key helpers

    fn key_version(linear_id: &LinearId, version: u64) -> Vec<u8> {
        let mut key = linear_id.as_bytes().to_vec();
        key.extend_from_slice(&version.to_be_bytes());
        key
    }

    fn key_current(kind: RecordKind, linear_id: &LinearId) -> Vec<u8> {
        let mut key = vec![kind as u8];
        key.extend_from_slice(linear_id.as_bytes());
        key
    }

    fn key_trade(kind: RecordKind, trade_id: &TradeId) -> Vec<u8> {
        let mut key = vec![kind as u8];
        key.extend_from_slice(trade_id.as_str().as_bytes());
        key
    }

    fn version_cf_name(kind: RecordKind) -> &'static str {
        match kind {
            RecordKind::Dcr => CF_DCR,
            RecordKind::Xvp => CF_XVP,
        }
    }

    // Current-version pointer

    /// Current version of a record, if any version has been committed
    pub fn current_version(&self, kind: RecordKind, linear_id: &LinearId) -> Result<Option<u64>> {
        let cf = self.cf_handle(CF_CURRENT)?;
        let key = Self::key_current(kind, linear_id);

        match self.db.get_cf(cf, &key)? {
            Some(value) => {
                let bytes: [u8; 8] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("Corrupt current-version pointer".to_string()))?;
                Ok(Some(u64::from_be_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    // Trade binding index

    /// Record bound to a trade, if any
    pub fn trade_binding(&self, kind: RecordKind, trade_id: &TradeId) -> Result<Option<LinearId>> {
        let cf = self.cf_handle(CF_TRADES)?;
        let key = Self::key_trade(kind, trade_id);

        match self.db.get_cf(cf, &key)? {
            Some(value) => {
                let bytes: [u8; 16] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("Corrupt trade-index entry".to_string()))?;
                Ok(Some(LinearId::from_uuid(uuid::Uuid::from_bytes(bytes))))
            }
            None => Ok(None),
        }
    }

    // Reservation reads

    /// Get a specific reservation version
    pub fn get_dcr_version(&self, linear_id: &LinearId, version: u64) -> Result<DcrRecord> {
        let cf = self.cf_handle(CF_DCR)?;
        let key = Self::key_version(linear_id, version);

        let value = self.db.get_cf(cf, &key)?.ok_or_else(|| {
            Error::RecordNotFound(format!("DCR {} version {}", linear_id, version))
        })?;

        let record: DcrRecord = bincode::deserialize(&value)?;
        Ok(record)
    }

    /// Get the current reservation version
    pub fn current_dcr(&self, linear_id: &LinearId) -> Result<DcrRecord> {
        let version = self
            .current_version(RecordKind::Dcr, linear_id)?
            .ok_or_else(|| Error::RecordNotFound(format!("DCR {}", linear_id)))?;
        self.get_dcr_version(linear_id, version)
    }

    /// Get the current reservation bound to a trade
    pub fn dcr_by_trade(&self, trade_id: &TradeId) -> Result<DcrRecord> {
        let linear_id = self
            .trade_binding(RecordKind::Dcr, trade_id)?
            .ok_or_else(|| Error::RecordNotFound(format!("DCR for trade {}", trade_id)))?;
        self.current_dcr(&linear_id)
    }

    /// Full version history of a reservation, oldest first
    pub fn dcr_history(&self, linear_id: &LinearId) -> Result<Vec<DcrRecord>> {
        self.history(RecordKind::Dcr, linear_id, |bytes| {
            bincode::deserialize::<DcrRecord>(bytes).map_err(Error::from)
        })
    }

    // Trade-record reads

    /// Get a specific trade-record version
    pub fn get_xvp_version(&self, linear_id: &LinearId, version: u64) -> Result<XvpRecord> {
        let cf = self.cf_handle(CF_XVP)?;
        let key = Self::key_version(linear_id, version);

        let value = self.db.get_cf(cf, &key)?.ok_or_else(|| {
            Error::RecordNotFound(format!("XVP {} version {}", linear_id, version))
        })?;

        let record: XvpRecord = bincode::deserialize(&value)?;
        Ok(record)
    }

    /// Get the current trade-record version
    pub fn current_xvp(&self, linear_id: &LinearId) -> Result<XvpRecord> {
        let version = self
            .current_version(RecordKind::Xvp, linear_id)?
            .ok_or_else(|| Error::RecordNotFound(format!("XVP {}", linear_id)))?;
        self.get_xvp_version(linear_id, version)
    }

    /// Get the current trade record for a trade ID
    pub fn xvp_by_trade(&self, trade_id: &TradeId) -> Result<XvpRecord> {
        let linear_id = self
            .trade_binding(RecordKind::Xvp, trade_id)?
            .ok_or_else(|| Error::RecordNotFound(format!("XVP for trade {}", trade_id)))?;
        self.current_xvp(&linear_id)
    }

    /// Full version history of a trade record, oldest first
    pub fn xvp_history(&self, linear_id: &LinearId) -> Result<Vec<XvpRecord>> {
        self.history(RecordKind::Xvp, linear_id, |bytes| {
            bincode::deserialize::<XvpRecord>(bytes).map_err(Error::from)
        })
    }

    fn history<R>(
        &self,
        kind: RecordKind,
        linear_id: &LinearId,
        decode: impl Fn(&[u8]) -> Result<R>,
    ) -> Result<Vec<R>> {
        let cf = self.cf_handle(Self::version_cf_name(kind))?;
        let prefix = linear_id.as_bytes().to_vec();

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(decode(&value)?);
        }

        Ok(records)
    }

    // Commit paths (called only from the single-writer oracle)

    /// Commit a reservation version: version row, current pointer, and trade
    /// binding move in one atomic batch
    pub fn commit_dcr(&self, record: &DcrRecord) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_versions = self.cf_handle(CF_DCR)?;
        let version_key = Self::key_version(&record.linear_id, record.version);
        let value = bincode::serialize(record)?;
        batch.put_cf(cf_versions, &version_key, &value);

        let cf_current = self.cf_handle(CF_CURRENT)?;
        let current_key = Self::key_current(RecordKind::Dcr, &record.linear_id);
        batch.put_cf(cf_current, &current_key, record.version.to_be_bytes());

        if let Some(ref trade_id) = record.trade_id {
            let cf_trades = self.cf_handle(CF_TRADES)?;
            let trade_key = Self::key_trade(RecordKind::Dcr, trade_id);
            batch.put_cf(cf_trades, &trade_key, record.linear_id.as_bytes());
        }

        self.db.write(batch)?;

        tracing::debug!(
            linear_id = %record.linear_id,
            version = record.version,
            status = %record.status,
            "DCR version committed"
        );

        Ok(())
    }

    /// Commit a trade-record version atomically
    pub fn commit_xvp(&self, record: &XvpRecord) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_versions = self.cf_handle(CF_XVP)?;
        let version_key = Self::key_version(&record.linear_id, record.version);
        let value = bincode::serialize(record)?;
        batch.put_cf(cf_versions, &version_key, &value);

        let cf_current = self.cf_handle(CF_CURRENT)?;
        let current_key = Self::key_current(RecordKind::Xvp, &record.linear_id);
        batch.put_cf(cf_current, &current_key, record.version.to_be_bytes());

        let cf_trades = self.cf_handle(CF_TRADES)?;
        let trade_key = Self::key_trade(RecordKind::Xvp, &record.trade_id);
        batch.put_cf(cf_trades, &trade_key, record.linear_id.as_bytes());

        self.db.write(batch)?;

        tracing::debug!(
            linear_id = %record.linear_id,
            version = record.version,
            status = %record.status,
            "XVP version committed"
        );

        Ok(())
    }

    // Statistics

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats> {
        let dcr_versions = self.approximate_count(self.cf_handle(CF_DCR)?)?;
        let xvp_versions = self.approximate_count(self.cf_handle(CF_XVP)?)?;

        Ok(StorageStats {
            dcr_versions,
            xvp_versions,
        })
    }

    fn approximate_count(&self, cf: &ColumnFamily) -> Result<u64> {
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate reservation version count
    pub dcr_versions: u64,
    /// Approximate trade version count
    pub xvp_versions: u64,
}
