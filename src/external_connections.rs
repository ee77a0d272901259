use sqlx::PgConnection;

/// A handle to an active database connection. Allows domain logic to stay agnostic of
/// whether it's running against a pooled connection or inside a transaction.
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to external systems the app communicates with. Driven adapters accept
/// an implementation of this so the same domain code can run against the live database,
/// a transaction, or a test fake.
pub trait ExternalConnectivity: Send {
    type Handle<'cxn>: ConnectionHandle + Send
    where
        Self: 'cxn;

    async fn database_cxn(&mut self) -> Result<Self::Handle<'_>, anyhow::Error>;
}

/// An in-progress set of operations which can be atomically committed.
pub trait TransactionHandle: ExternalConnectivity {
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Implemented by connectivity sources which can open a transaction over their
/// current connection set.
pub trait Transactable<Handle: TransactionHandle>: Sync {
    async fn start_transaction(&self) -> Result<Handle, anyhow::Error>;
}

#[cfg(test)]
pub mod test_util {
    use super::*;

    /// Stand-in connectivity for unit tests. In-memory driven port fakes never touch
    /// the database, so handing out a real connection is unnecessary.
    pub struct FakeExternalConnectivity {
        is_transacting: bool,
    }

    impl FakeExternalConnectivity {
        pub fn new() -> Self {
            FakeExternalConnectivity {
                is_transacting: false,
            }
        }

        pub fn is_transacting(&self) -> bool {
            self.is_transacting
        }
    }

    pub struct NoDatabaseHandle;

    impl ConnectionHandle for NoDatabaseHandle {
        fn borrow_connection(&mut self) -> &mut PgConnection {
            panic!("Tried to borrow a real database connection inside a unit test")
        }
    }

    impl ExternalConnectivity for FakeExternalConnectivity {
        type Handle<'cxn>
            = NoDatabaseHandle
        where
            Self: 'cxn;

        async fn database_cxn(&mut self) -> Result<NoDatabaseHandle, anyhow::Error> {
            Ok(NoDatabaseHandle)
        }
    }

    impl TransactionHandle for FakeExternalConnectivity {
        async fn commit(self) -> Result<(), anyhow::Error> {
            Ok(())
        }
    }

    impl Transactable<FakeExternalConnectivity> for FakeExternalConnectivity {
        async fn start_transaction(&self) -> Result<FakeExternalConnectivity, anyhow::Error> {
            Ok(FakeExternalConnectivity {
                is_transacting: true,
            })
        }
    }
}
