use super::*;

/// Resolves logical connection indices against the configured profiles.
pub struct Resolver<'a, C> {
    profiles: &'a [ProfileEntry],
    connector: C,
}

impl<'a, C> Resolver<'a, C>
where
    C: Connector,
{
    pub fn new(profiles: &'a [ProfileEntry], connector: C) -> Self {
        Self {
            profiles,
            connector,
        }
    }

    /// Validates the profile at `index` without touching the network.
    pub fn profile(&self, index: usize) -> Result<ConnectionProfile> {
        self.profiles
            .get(index)
            .ok_or_else(|| {
                ReplicationError::configuration(format!(
                    "connection index {} out of range ({} configured)",
                    index,
                    self.profiles.len()
                ))
            })?
            .profile()
            .map_err(|e| ReplicationError::configuration(format!("connection {}: {}", index, e)))
    }

    pub async fn resolve(&self, index: usize) -> Result<C::Connection> {
        let profile = self.profile(index)?;
        log::debug!("connecting to {} (index {})", profile, index);
        self.connector.connect(&profile).await
    }
}
