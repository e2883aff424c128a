//! In-memory folder hierarchy for one owner.
//!
//! Folders live in a flat arena; parent/child relations are ids resolved
//! through an index, never references between nodes.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::Folder;

#[derive(Debug, Default)]
pub struct FolderTree {
    nodes: Vec<Folder>,
    index: HashMap<Uuid, usize>,
    children: HashMap<Option<Uuid>, Vec<usize>>,
}

impl FolderTree {
    pub fn build(folders: Vec<Folder>) -> Self {
        let mut tree = Self::default();
        for folder in folders {
            let slot = tree.nodes.len();
            tree.index.insert(folder.id, slot);
            tree.children.entry(folder.parent_id).or_default().push(slot);
            tree.nodes.push(folder);
        }
        for slots in tree.children.values_mut() {
            slots.sort_by(|a, b| tree.nodes[*a].name.cmp(&tree.nodes[*b].name));
        }
        tree
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    fn get(&self, id: Uuid) -> Option<&Folder> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Direct children of `parent` (`None` = root), sorted by name.
    pub fn children(&self, parent: Option<Uuid>) -> impl Iterator<Item = &Folder> + '_ {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .map(|&slot| &self.nodes[slot])
    }

    /// Breadcrumb from the root down to `id` (inclusive). Empty if `id` is
    /// unknown. Stops early on a malformed cycle.
    pub fn path_to(&self, id: Uuid) -> Vec<&Folder> {
        let mut path = Vec::new();
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            let Some(folder) = self.get(current) else {
                break;
            };
            if path.len() > self.nodes.len() {
                break;
            }
            path.push(folder);
            cursor = folder.parent_id;
        }

        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn folder(name: &str, parent_id: Option<Uuid>) -> Folder {
        Folder {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
            owner: "alice".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn breadcrumbs_and_children() {
        let work = folder("Work", None);
        let reports = folder("Reports", Some(work.id));
        let q1 = folder("Q1", Some(reports.id));
        let archive = folder("Archive", Some(work.id));
        let home = folder("Home", None);

        let tree = FolderTree::build(vec![
            q1.clone(),
            work.clone(),
            reports.clone(),
            archive.clone(),
            home.clone(),
        ]);
        assert!([work.id, reports.id, q1.id, archive.id, home.id]
            .iter()
            .all(|id| tree.contains(*id)));

        let path: Vec<_> = tree.path_to(q1.id).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(path, ["Work", "Reports", "Q1"]);

        let roots: Vec<_> = tree.children(None).map(|f| f.name.as_str()).collect();
        assert_eq!(roots, ["Home", "Work"]);

        let under_work: Vec<_> = tree.children(Some(work.id)).map(|f| f.id).collect();
        assert_eq!(under_work, [archive.id, reports.id]);

        assert_eq!(tree.children(Some(q1.id)).count(), 0);
    }

    #[test]
    fn unknown_folder() {
        let tree = FolderTree::build(Vec::new());
        assert_eq!(tree.children(None).count(), 0);
        assert!(!tree.contains(Uuid::new_v4()));
        assert!(tree.path_to(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn cycle_does_not_loop_forever() {
        let mut a = folder("A", None);
        let b = folder("B", Some(a.id));
        a.parent_id = Some(b.id);

        let tree = FolderTree::build(vec![a.clone(), b]);
        assert!(tree.path_to(a.id).len() <= 3);
    }
}
