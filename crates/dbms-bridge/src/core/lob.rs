//! BLOB/CLOB update lifecycle.
//!
//! Updating a LOB column is a three step protocol: open a handle for the
//! column, write the content through exactly one [`LobWriter`], then commit
//! the writer back into the result set. Each step consumes the previous
//! value, so the order cannot be violated. How the handle is obtained
//! differs by dialect, see [`LobStrategy`].

use std::fmt;
use std::io::{self, Write};

use tracing::debug;

use super::connection::DriverResult;
use crate::error::{DbmsError, Result};

/// Kind of large object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobKind {
    Blob,
    Clob,
}

impl fmt::Display for LobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobKind::Blob => f.write_str("BLOB"),
            LobKind::Clob => f.write_str("CLOB"),
        }
    }
}

/// A LOB object owned by the driver (a locator or a freshly created LOB).
pub trait DriverLob: Write + Send + fmt::Debug {}

impl<T: Write + Send + fmt::Debug> DriverLob for T {}

/// Updatable result set columns, as supplied by the driver layer.
///
/// Column numbers are 1-based.
pub trait LobColumns {
    /// The LOB currently stored in a column, `None` when the column is NULL.
    fn column_lob(&mut self, column: usize, kind: LobKind)
        -> DriverResult<Option<Box<dyn DriverLob>>>;

    /// Create a new, empty LOB on the statement's connection.
    fn create_lob(&mut self, kind: LobKind) -> DriverResult<Box<dyn DriverLob>>;

    /// Store a driver LOB into a column of the current row.
    fn update_lob(&mut self, column: usize, lob: Box<dyn DriverLob>) -> DriverResult<()>;

    /// Store raw content into a column of the current row.
    fn update_bytes(&mut self, column: usize, kind: LobKind, data: Vec<u8>) -> DriverResult<()>;
}

/// How a dialect obtains a writable LOB for an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobStrategy {
    /// Write through the locator already stored in the column.
    Locator,
    /// Create an empty LOB up front; the dialect cannot grow a stored LOB.
    CreateUpFront,
    /// Collect content in a temporary buffer and store it on commit.
    Buffered,
}

enum HandleState {
    Driver(Box<dyn DriverLob>),
    Buffer(Vec<u8>),
}

impl fmt::Debug for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleState::Driver(lob) => f.debug_tuple("Driver").field(lob).finish(),
            HandleState::Buffer(buf) => write!(f, "Buffer({} bytes)", buf.len()),
        }
    }
}

/// An opened, not yet written LOB update.
#[derive(Debug)]
pub struct LobHandle {
    kind: LobKind,
    state: HandleState,
}

impl LobHandle {
    pub fn kind(&self) -> LobKind {
        self.kind
    }

    /// Turn the handle into its single writer.
    pub fn into_writer(self) -> LobWriter {
        LobWriter {
            kind: self.kind,
            state: self.state,
        }
    }
}

/// Writer for the content of one LOB update.
#[derive(Debug)]
pub struct LobWriter {
    kind: LobKind,
    state: HandleState,
}

impl LobWriter {
    pub fn kind(&self) -> LobKind {
        self.kind
    }
}

impl Write for LobWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            HandleState::Driver(lob) => lob.write(buf),
            HandleState::Buffer(data) => data.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            HandleState::Driver(lob) => lob.flush(),
            HandleState::Buffer(_) => Ok(()),
        }
    }
}

impl LobStrategy {
    /// Open an update handle for `column` of the current row.
    pub fn open(
        self,
        rs: &mut dyn LobColumns,
        column: usize,
        kind: LobKind,
    ) -> Result<LobHandle> {
        let state = match self {
            LobStrategy::Locator => {
                let existing = rs.column_lob(column, kind).map_err(|e| {
                    DbmsError::driver(format!("reading {} locator of column {}", kind, column), e)
                })?;
                match existing {
                    Some(lob) => HandleState::Driver(lob),
                    None => {
                        debug!("column {} holds no {} locator, creating a new one", column, kind);
                        HandleState::Driver(create(rs, column, kind)?)
                    }
                }
            }
            LobStrategy::CreateUpFront => HandleState::Driver(create(rs, column, kind)?),
            LobStrategy::Buffered => HandleState::Buffer(Vec::new()),
        };
        Ok(LobHandle { kind, state })
    }

    /// Store the written content into `column` of the current row.
    pub fn commit(self, rs: &mut dyn LobColumns, column: usize, writer: LobWriter) -> Result<()> {
        let LobWriter { kind, state } = writer;
        match state {
            HandleState::Driver(mut lob) => {
                lob.flush().map_err(DbmsError::Io)?;
                rs.update_lob(column, lob).map_err(|e| {
                    DbmsError::driver(format!("updating {} column {}", kind, column), e)
                })
            }
            HandleState::Buffer(data) => rs.update_bytes(column, kind, data).map_err(|e| {
                DbmsError::driver(format!("updating {} column {} from buffer", kind, column), e)
            }),
        }
    }
}

fn create(rs: &mut dyn LobColumns, column: usize, kind: LobKind) -> Result<Box<dyn DriverLob>> {
    rs.create_lob(kind)
        .map_err(|e| DbmsError::driver(format!("creating {} for column {}", kind, column), e))
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory result set row used by LOB tests.

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Shared byte buffer standing in for a driver LOB.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryLob(pub Arc<Mutex<Vec<u8>>>);

    impl Write for MemoryLob {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct MockRow {
        pub stored: HashMap<usize, MemoryLob>,
        pub created: usize,
        pub updated_lobs: Vec<usize>,
        pub updated_bytes: HashMap<usize, Vec<u8>>,
        pub last_created: Option<MemoryLob>,
    }

    impl LobColumns for MockRow {
        fn column_lob(
            &mut self,
            column: usize,
            _kind: LobKind,
        ) -> DriverResult<Option<Box<dyn DriverLob>>> {
            Ok(self
                .stored
                .get(&column)
                .cloned()
                .map(|lob| Box::new(lob) as Box<dyn DriverLob>))
        }

        fn create_lob(&mut self, _kind: LobKind) -> DriverResult<Box<dyn DriverLob>> {
            self.created += 1;
            let lob = MemoryLob::default();
            self.last_created = Some(lob.clone());
            Ok(Box::new(lob))
        }

        fn update_lob(&mut self, column: usize, _lob: Box<dyn DriverLob>) -> DriverResult<()> {
            self.updated_lobs.push(column);
            Ok(())
        }

        fn update_bytes(
            &mut self,
            column: usize,
            _kind: LobKind,
            data: Vec<u8>,
        ) -> DriverResult<()> {
            self.updated_bytes.insert(column, data);
            Ok(())
        }
    }
}
