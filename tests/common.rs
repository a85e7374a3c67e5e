#![allow(dead_code)]

use assert_cmd::Command;
use cardinal_rs::executor::{
    BackendConnection, BackendError, DataSource, ExecutionContext, IndexInfoCursor, IndexInfoRow,
};
use cardinal_rs::statistics::TableRef;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Returns a configured Command for the `cardinal` binary
pub fn cardinal_cmd() -> Command {
    Command::cargo_bin("cardinal").expect("Binary not found")
}

/// What a probe query does against the fake backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Match,
    NoMatch,
    Fail,
}

/// Resource and call counters shared between a fake source and its tests.
#[derive(Debug, Default)]
pub struct Counters {
    pub connections_opened: AtomicUsize,
    pub connections_closed: AtomicUsize,
    pub cursors_opened: AtomicUsize,
    pub cursors_closed: AtomicUsize,
    pub probes: AtomicUsize,
    pub statements: Mutex<Vec<String>>,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.connections_closed.load(Ordering::SeqCst)
    }

    pub fn cursors_opened(&self) -> usize {
        self.cursors_opened.load(Ordering::SeqCst)
    }

    pub fn cursors_closed(&self) -> usize {
        self.cursors_closed.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

/// In-memory backend standing in for an ODBC data source.
#[derive(Debug)]
pub struct FakeDataSource {
    pub product_name: String,
    pub version: String,
    pub quote: Option<String>,
    pub fail_product_name: bool,
    pub fail_version: bool,
    pub fail_quote: bool,
    pub fail_connect: bool,
    pub index_rows: Vec<IndexInfoRow>,
    /// Index metadata read fails when this row position is reached.
    pub fail_index_at: Option<usize>,
    /// The caller's context is cancelled after this many rows were read.
    pub cancel_after_rows: Option<usize>,
    pub probe: ProbeOutcome,
    pub count: Option<u64>,
    pub fail_count: bool,
    /// How long a count statement runs; aborted like a driver would once the
    /// context is cancelled or expires.
    pub count_duration: Option<Duration>,
    pub counters: Arc<Counters>,
}

impl FakeDataSource {
    pub fn new(product_name: &str, version: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            version: version.to_string(),
            quote: None,
            fail_product_name: false,
            fail_version: false,
            fail_quote: false,
            fail_connect: false,
            index_rows: Vec::new(),
            fail_index_at: None,
            cancel_after_rows: None,
            probe: ProbeOutcome::NoMatch,
            count: None,
            fail_count: false,
            count_duration: None,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<IndexInfoRow>) -> Self {
        self.index_rows = rows;
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_quote(mut self, quote: &str) -> Self {
        self.quote = Some(quote.to_string());
        self
    }

    pub fn with_probe(mut self, probe: ProbeOutcome) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_slow_count(mut self, count: u64, duration: Duration) -> Self {
        self.count = Some(count);
        self.count_duration = Some(duration);
        self
    }
}

/// Run a statement for `duration`, aborting when `ctx` is cancelled.
fn run_statement(duration: Duration, ctx: &ExecutionContext) -> Result<(), BackendError> {
    let started = Instant::now();
    while started.elapsed() < duration {
        if ctx.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        thread::sleep(Duration::from_millis(5));
    }
    Ok(())
}

impl DataSource for FakeDataSource {
    fn connect(&self) -> Result<Box<dyn BackendConnection + '_>, BackendError> {
        if self.fail_connect {
            return Err(BackendError::ConnectionFailed("fake source refuses connections".to_string()));
        }
        self.counters.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection { source: self }))
    }
}

pub struct FakeConnection<'a> {
    source: &'a FakeDataSource,
}

impl Drop for FakeConnection<'_> {
    fn drop(&mut self) {
        self.source.counters.connections_closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl BackendConnection for FakeConnection<'_> {
    fn product_name(&mut self) -> Result<String, BackendError> {
        if self.source.fail_product_name {
            return Err(BackendError::QueryFailed("metadata unavailable".to_string()));
        }
        Ok(self.source.product_name.clone())
    }

    fn product_version(&mut self) -> Result<String, BackendError> {
        if self.source.fail_version {
            return Err(BackendError::QueryFailed("version query failed".to_string()));
        }
        Ok(self.source.version.clone())
    }

    fn identifier_quote(&mut self) -> Result<Option<String>, BackendError> {
        if self.source.fail_quote {
            return Err(BackendError::QueryFailed("quote unavailable".to_string()));
        }
        Ok(self.source.quote.clone())
    }

    fn index_info<'c>(
        &'c mut self,
        _table: &TableRef<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Box<dyn IndexInfoCursor + 'c>, BackendError> {
        ctx.check()?;
        self.source.counters.cursors_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCursor {
            rows: self.source.index_rows.clone().into_iter(),
            position: 0,
            fail_at: self.source.fail_index_at,
            cancel_after: self.source.cancel_after_rows,
            ctx: ctx.clone(),
            counters: &self.source.counters,
        }))
    }

    fn query_count(&mut self, sql: &str, ctx: &ExecutionContext) -> Result<Option<u64>, BackendError> {
        ctx.check()?;
        self.source.counters.statements.lock().unwrap().push(sql.to_string());
        if self.source.fail_count {
            return Err(BackendError::QueryFailed("count failed".to_string()));
        }
        if let Some(duration) = self.source.count_duration {
            run_statement(duration, ctx)?;
        }
        Ok(self.source.count)
    }

    fn probe(&mut self, sql: &str) -> Result<bool, BackendError> {
        self.source.counters.probes.fetch_add(1, Ordering::SeqCst);
        self.source.counters.statements.lock().unwrap().push(sql.to_string());
        match self.source.probe {
            ProbeOutcome::Match => Ok(true),
            ProbeOutcome::NoMatch => Ok(false),
            ProbeOutcome::Fail => Err(BackendError::QueryFailed("Unknown table 'engines'".to_string())),
        }
    }
}

struct FakeCursor<'c> {
    rows: std::vec::IntoIter<IndexInfoRow>,
    position: usize,
    fail_at: Option<usize>,
    cancel_after: Option<usize>,
    ctx: ExecutionContext,
    counters: &'c Counters,
}

impl IndexInfoCursor for FakeCursor<'_> {
    fn next_row(&mut self) -> Result<Option<IndexInfoRow>, BackendError> {
        if self.fail_at == Some(self.position) {
            return Err(BackendError::QueryFailed(format!("read failed at row {}", self.position)));
        }
        if self.cancel_after == Some(self.position) {
            self.ctx.cancel();
        }
        self.position += 1;
        Ok(self.rows.next())
    }
}

impl Drop for FakeCursor<'_> {
    fn drop(&mut self) {
        self.counters.cursors_closed.fetch_add(1, Ordering::SeqCst);
    }
}
