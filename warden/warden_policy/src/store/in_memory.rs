//! In-memory policy store.
//!
//! This module provides an in-memory implementation of all four listers,
//! with validated writes.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use warden_core::{Context, Error, ErrorList, Result, Selector, StoreError};

use super::{ClusterLister, NamespaceLister, PolicyBundle, ALL_NAMESPACES};
use crate::model::{ClusterRole, ClusterRoleBinding, PolicyObject, Role, RoleBinding};
use crate::validation;

type Key = (String, String);

/// Objects of one kind, keyed by namespace and name.
struct Table<T> {
    objects: DashMap<Key, Arc<T>>,
}

impl<T: PolicyObject> Table<T> {
    fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    fn scope(namespace: &str) -> Option<&str> {
        if T::NAMESPACED {
            Some(namespace)
        } else {
            None
        }
    }

    fn not_found(namespace: &str, name: &str) -> Error {
        StoreError::not_found(T::KIND, Self::scope(namespace), name).into()
    }

    fn key_of(object: &T) -> Key {
        let meta = object.metadata();
        (meta.namespace.clone(), meta.name.clone())
    }

    fn create(&self, object: T, validate: fn(&T) -> ErrorList) -> Result<()> {
        validate(&object).into_result().map_err(Error::Invalid)?;

        match self.objects.entry(Self::key_of(&object)) {
            Entry::Occupied(entry) => {
                let (namespace, name) = entry.key();
                Err(StoreError::already_exists(T::KIND, Self::scope(namespace), name).into())
            }
            Entry::Vacant(entry) => {
                debug!(kind = T::KIND, object = %object.metadata(), "Created policy object");
                entry.insert(Arc::new(object));
                Ok(())
            }
        }
    }

    fn update(&self, object: T, validate: fn(&T, &T) -> ErrorList) -> Result<()> {
        let key = Self::key_of(&object);
        let mut current = self
            .objects
            .get_mut(&key)
            .ok_or_else(|| Self::not_found(&key.0, &key.1))?;

        validate(&object, current.value())
            .into_result()
            .map_err(Error::Invalid)?;

        debug!(kind = T::KIND, object = %object.metadata(), "Updated policy object");
        *current = Arc::new(object);
        Ok(())
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let key = (namespace.to_string(), name.to_string());
        if self.objects.remove(&key).is_none() {
            return Err(Self::not_found(namespace, name));
        }

        debug!(kind = T::KIND, namespace, name, "Deleted policy object");
        Ok(())
    }

    fn get(&self, namespace: &str, name: &str) -> Result<Arc<T>> {
        let key = (namespace.to_string(), name.to_string());
        self.objects
            .get(&key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Self::not_found(namespace, name))
    }

    fn list(&self, namespace: &str, selector: &Selector) -> Vec<Arc<T>> {
        let mut matched: Vec<(Key, Arc<T>)> = self
            .objects
            .iter()
            .filter(|entry| namespace == ALL_NAMESPACES || entry.key().0 == namespace)
            .filter(|entry| selector.matches(&entry.value().metadata().labels))
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        // Sorted by namespace, then name.
        matched.sort_by(|a, b| a.0.cmp(&b.0));
        matched.into_iter().map(|(_, object)| object).collect()
    }

    fn clear(&self) {
        self.objects.clear();
    }
}

/// An in-memory policy store.
#[derive(Clone)]
pub struct InMemoryPolicyStore {
    roles: Arc<Table<Role>>,
    role_bindings: Arc<Table<RoleBinding>>,
    cluster_roles: Arc<Table<ClusterRole>>,
    cluster_role_bindings: Arc<Table<ClusterRoleBinding>>,
}

impl InMemoryPolicyStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            roles: Arc::new(Table::new()),
            role_bindings: Arc::new(Table::new()),
            cluster_roles: Arc::new(Table::new()),
            cluster_role_bindings: Arc::new(Table::new()),
        }
    }

    /// Create a store holding every object in `bundle`.
    pub fn from_bundle(bundle: PolicyBundle) -> Result<Self> {
        let store = Self::new();
        store.load_bundle(bundle)?;
        Ok(store)
    }

    /// Create every object in `bundle`.
    ///
    /// Objects are created roles first, then bindings. Loading stops at the
    /// first rejected object; objects created before it remain.
    pub fn load_bundle(&self, bundle: PolicyBundle) -> Result<()> {
        let PolicyBundle {
            roles,
            role_bindings,
            cluster_roles,
            cluster_role_bindings,
        } = bundle;

        for role in cluster_roles {
            self.create_cluster_role(role)?;
        }
        for role in roles {
            self.create_role(role)?;
        }
        for binding in cluster_role_bindings {
            self.create_cluster_role_binding(binding)?;
        }
        for binding in role_bindings {
            self.create_role_binding(binding)?;
        }

        Ok(())
    }

    /// Remove every object.
    pub fn clear(&self) {
        self.roles.clear();
        self.role_bindings.clear();
        self.cluster_roles.clear();
        self.cluster_role_bindings.clear();
    }

    /// Create a role.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the role was valid and did not exist yet.
    /// * `Err(Error::Invalid)` - If validation failed.
    /// * `Err(Error::Store)` - If a role with the same name exists.
    pub fn create_role(&self, role: Role) -> Result<()> {
        self.roles.create(role, validation::validate_role)
    }

    /// Replace an existing role.
    pub fn update_role(&self, role: Role) -> Result<()> {
        self.roles.update(role, validation::validate_role_update)
    }

    /// Delete a role.
    pub fn delete_role(&self, namespace: &str, name: &str) -> Result<()> {
        self.roles.delete(namespace, name)
    }

    /// Create a role binding.
    pub fn create_role_binding(&self, binding: RoleBinding) -> Result<()> {
        self.role_bindings
            .create(binding, validation::validate_role_binding)
    }

    /// Replace an existing role binding. The role reference cannot change.
    pub fn update_role_binding(&self, binding: RoleBinding) -> Result<()> {
        self.role_bindings
            .update(binding, validation::validate_role_binding_update)
    }

    /// Delete a role binding.
    pub fn delete_role_binding(&self, namespace: &str, name: &str) -> Result<()> {
        self.role_bindings.delete(namespace, name)
    }

    /// Create a cluster role.
    pub fn create_cluster_role(&self, role: ClusterRole) -> Result<()> {
        self.cluster_roles
            .create(role, validation::validate_cluster_role)
    }

    /// Replace an existing cluster role.
    pub fn update_cluster_role(&self, role: ClusterRole) -> Result<()> {
        self.cluster_roles
            .update(role, validation::validate_cluster_role_update)
    }

    /// Delete a cluster role.
    pub fn delete_cluster_role(&self, name: &str) -> Result<()> {
        self.cluster_roles.delete("", name)
    }

    /// Create a cluster role binding.
    pub fn create_cluster_role_binding(&self, binding: ClusterRoleBinding) -> Result<()> {
        self.cluster_role_bindings
            .create(binding, validation::validate_cluster_role_binding)
    }

    /// Replace an existing cluster role binding. The role reference cannot
    /// change.
    pub fn update_cluster_role_binding(&self, binding: ClusterRoleBinding) -> Result<()> {
        self.cluster_role_bindings
            .update(binding, validation::validate_cluster_role_binding_update)
    }

    /// Delete a cluster role binding.
    pub fn delete_cluster_role_binding(&self, name: &str) -> Result<()> {
        self.cluster_role_bindings.delete("", name)
    }
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceLister<Role> for InMemoryPolicyStore {
    fn list(&self, ctx: &Context, namespace: &str, selector: &Selector) -> Result<Vec<Arc<Role>>> {
        ctx.check()?;
        Ok(self.roles.list(namespace, selector))
    }

    fn get(&self, ctx: &Context, namespace: &str, name: &str) -> Result<Arc<Role>> {
        ctx.check()?;
        self.roles.get(namespace, name)
    }
}

impl NamespaceLister<RoleBinding> for InMemoryPolicyStore {
    fn list(
        &self,
        ctx: &Context,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Arc<RoleBinding>>> {
        ctx.check()?;
        Ok(self.role_bindings.list(namespace, selector))
    }

    fn get(&self, ctx: &Context, namespace: &str, name: &str) -> Result<Arc<RoleBinding>> {
        ctx.check()?;
        self.role_bindings.get(namespace, name)
    }
}

impl ClusterLister<ClusterRole> for InMemoryPolicyStore {
    fn list(&self, ctx: &Context, selector: &Selector) -> Result<Vec<Arc<ClusterRole>>> {
        ctx.check()?;
        Ok(self.cluster_roles.list(ALL_NAMESPACES, selector))
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<Arc<ClusterRole>> {
        ctx.check()?;
        self.cluster_roles.get("", name)
    }
}

impl ClusterLister<ClusterRoleBinding> for InMemoryPolicyStore {
    fn list(&self, ctx: &Context, selector: &Selector) -> Result<Vec<Arc<ClusterRoleBinding>>> {
        ctx.check()?;
        Ok(self.cluster_role_bindings.list(ALL_NAMESPACES, selector))
    }

    fn get(&self, ctx: &Context, name: &str) -> Result<Arc<ClusterRoleBinding>> {
        ctx.check()?;
        self.cluster_role_bindings.get("", name)
    }
}
