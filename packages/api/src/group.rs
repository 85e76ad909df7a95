//! Group representation: `GET /groups/` and `GET /groups/{id}/`.

use serde::{Deserialize, Serialize};
use yatube::{Group, GroupId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupRepr {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<Group> for GroupRepr {
    fn from(g: Group) -> Self {
        Self {
            id: g.id,
            title: g.title,
            slug: g.slug,
            description: g.description,
        }
    }
}
