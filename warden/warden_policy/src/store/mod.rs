//! Policy storage.
//!
//! The decision engine reads policy objects only through the lister traits
//! defined here. Listers return shared, immutable snapshots; callers must
//! not expect later writes to show up in an object they already hold.

mod bundle;
mod in_memory;

pub use bundle::PolicyBundle;
pub use in_memory::InMemoryPolicyStore;

use std::sync::Arc;
use warden_core::{Context, Result, Selector};

use crate::model::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};

/// Namespace value that lists across every namespace.
pub const ALL_NAMESPACES: &str = "";

/// Read access to a cluster-scoped kind.
pub trait ClusterLister<T>: Send + Sync {
    /// List objects whose labels match a selector.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The evaluation context; checked before any work is done.
    /// * `selector` - The label selector to filter by.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Arc<T>>)` - The matching objects, possibly none.
    /// * `Err` - If the store failed or the context was aborted.
    fn list(&self, ctx: &Context, selector: &Selector) -> Result<Vec<Arc<T>>>;

    /// Get an object by name.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The evaluation context.
    /// * `name` - The object name.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<T>)` - The object.
    /// * `Err` - `StoreError::NotFound` if no such object exists, or another
    ///   error if the store failed.
    fn get(&self, ctx: &Context, name: &str) -> Result<Arc<T>>;
}

/// Read access to a namespaced kind.
pub trait NamespaceLister<T>: Send + Sync {
    /// List objects in `namespace` whose labels match a selector.
    ///
    /// Passing [`ALL_NAMESPACES`] lists across every namespace.
    fn list(&self, ctx: &Context, namespace: &str, selector: &Selector) -> Result<Vec<Arc<T>>>;

    /// Get an object by namespace and name.
    fn get(&self, ctx: &Context, namespace: &str, name: &str) -> Result<Arc<T>>;
}

/// The four listers the RBAC authorizer reads from.
#[derive(Clone)]
pub struct PolicyListers {
    /// Namespaced roles.
    pub roles: Arc<dyn NamespaceLister<Role>>,

    /// Namespaced role bindings.
    pub role_bindings: Arc<dyn NamespaceLister<RoleBinding>>,

    /// Cluster roles.
    pub cluster_roles: Arc<dyn ClusterLister<ClusterRole>>,

    /// Cluster role bindings.
    pub cluster_role_bindings: Arc<dyn ClusterLister<ClusterRoleBinding>>,
}

impl PolicyListers {
    /// Use one store for all four kinds.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: NamespaceLister<Role>
            + NamespaceLister<RoleBinding>
            + ClusterLister<ClusterRole>
            + ClusterLister<ClusterRoleBinding>
            + 'static,
    {
        Self {
            roles: store.clone(),
            role_bindings: store.clone(),
            cluster_roles: store.clone(),
            cluster_role_bindings: store,
        }
    }
}

impl std::fmt::Debug for PolicyListers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyListers").finish_non_exhaustive()
    }
}
