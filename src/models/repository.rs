use serde::{Deserialize, Serialize};

/// A repository as returned by the listing endpoint. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

impl Repository {
    /// `owner/name`, the form used on the command line.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn matches(&self, full_name: &str) -> bool {
        match full_name.split_once('/') {
            Some((owner, name)) => self.owner == owner && self.name == name,
            None => false,
        }
    }
}
