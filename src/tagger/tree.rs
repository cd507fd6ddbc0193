// src/tagger/tree.rs

//! The tag graph and the tag-matching algorithm.
//!
//! Tag resources form a directed acyclic graph with multiple roots: each
//! node wraps one keyword list, `parents` edges point towards coarser
//! categories and `grants` edges attach extra tags to any matching text.
//! Root-to-node paths are precomputed at build time so the matcher never
//! walks the graph per query.
//!
//! The tree is built once at startup and never mutated; reloading edited
//! resources means building a fresh `Tree` and swapping it in.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{AppError, Result};
use crate::tagger::{Keyword, KeywordList};
use crate::utils::normalize_words;

/// Index of a node inside its tree.
pub type NodeId = usize;

/// A named classification unit: one keyword list plus its graph edges.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node identity; the resource's base filename
    pub name: String,

    /// Display label
    pub label: String,

    /// Keywords from the node's resource
    pub keywords: Vec<Keyword>,

    /// Parent nodes
    pub parents: Vec<NodeId>,

    /// Nodes granted to any text matching this node
    pub grants: Vec<NodeId>,

    /// All root-to-this-node paths, one per parent chain
    pub paths: Vec<TagPath>,
}

impl Node {
    fn from_list(list: &KeywordList) -> Self {
        Self {
            name: list.name.clone(),
            label: list.label.clone(),
            keywords: list.keywords.clone(),
            parents: Vec::new(),
            grants: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// True iff any of this node's keywords matches the normalized text.
    pub fn matches(&self, text: &str, language: &str) -> bool {
        for keyword in &self.keywords {
            if keyword.matches(text, language) {
                debug!("Text matches [{}] in node {}", keyword.word, self.name);
                return true;
            }
        }
        false
    }
}

/// An ordered chain of node ids from a root down to a descendant, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagPath {
    pub nodes: Vec<NodeId>,
}

/// The full tag graph, keyed by node name.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
}

impl Tree {
    /// Load all tag resources (`.txt`/`.html`) from a directory and build
    /// the graph. Resources are read in sorted filename order so path
    /// ordering is reproducible.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            match path.extension().and_then(|s| s.to_str()) {
                Some("txt") | Some("html") => paths.push(path),
                _ => {}
            }
        }
        paths.sort();

        let mut lists = Vec::with_capacity(paths.len());
        for path in &paths {
            lists.push(KeywordList::load(path)?);
        }

        let tree = Self::build(lists)?;
        info!("Loaded tag tree with {} nodes from {}", tree.len(), dir.display());
        Ok(tree)
    }

    /// Build a tree from already-parsed keyword lists, in order:
    /// create nodes, validate parent/grant references, link edges, then
    /// compute every node's root paths.
    pub fn build(lists: Vec<KeywordList>) -> Result<Self> {
        let mut tree = Tree::default();

        // Step 1: one node per list
        for list in &lists {
            let id = tree.nodes.len();
            if tree.by_name.insert(list.name.clone(), id).is_some() {
                return Err(AppError::config(format!(
                    "duplicate tag resource name '{}'",
                    list.name
                )));
            }
            tree.nodes.push(Node::from_list(list));
        }

        // Step 2: every referenced name must resolve. Forward references are
        // fine since all lists are loaded before linking.
        for list in &lists {
            for name in list.parent_tags.iter().chain(list.grant_tags.iter()) {
                if !tree.by_name.contains_key(name) {
                    return Err(AppError::UnknownTagReference {
                        name: name.clone(),
                        referenced_by: list.name.clone(),
                    });
                }
            }
        }

        // Step 3: link edges
        for (id, list) in lists.iter().enumerate() {
            tree.nodes[id].parents = list.parent_tags.iter().map(|n| tree.by_name[n]).collect();
            tree.nodes[id].grants = list.grant_tags.iter().map(|n| tree.by_name[n]).collect();
        }

        // Step 4: map all paths, memoized across nodes
        let mut memo: HashMap<NodeId, Vec<TagPath>> = HashMap::new();
        let mut all_paths = Vec::with_capacity(tree.nodes.len());
        for id in 0..tree.nodes.len() {
            let mut visiting = Vec::new();
            all_paths.push(tree.paths_for(id, &mut memo, &mut visiting)?);
        }
        for (id, paths) in all_paths.into_iter().enumerate() {
            tree.nodes[id].paths = paths;
        }

        Ok(tree)
    }

    /// Recursively compute the root paths of a node. A node on its own
    /// `visiting` stack means the parent graph has a cycle, which is a fatal
    /// configuration error.
    fn paths_for(
        &self,
        id: NodeId,
        memo: &mut HashMap<NodeId, Vec<TagPath>>,
        visiting: &mut Vec<NodeId>,
    ) -> Result<Vec<TagPath>> {
        if let Some(paths) = memo.get(&id) {
            return Ok(paths.clone());
        }

        if visiting.contains(&id) {
            let chain = visiting
                .iter()
                .chain(std::iter::once(&id))
                .map(|&i| self.nodes[i].name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(AppError::CyclicTagGraph { chain });
        }

        visiting.push(id);
        let paths = if self.nodes[id].parents.is_empty() {
            vec![TagPath { nodes: vec![id] }]
        } else {
            let mut paths = Vec::new();
            for &parent in &self.nodes[id].parents {
                for mut path in self.paths_for(parent, memo, visiting)? {
                    path.nodes.push(id);
                    paths.push(path);
                }
            }
            paths
        };
        visiting.pop();

        memo.insert(id, paths.clone());
        Ok(paths)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fetch a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Look up a node by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).map(|&id| &self.nodes[id])
    }

    /// Iterate over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// The names along a path, root first.
    pub fn path_names(&self, path: &TagPath) -> Vec<&str> {
        path.nodes.iter().map(|&id| self.nodes[id].name.as_str()).collect()
    }

    /// Find all tags that apply to this text.
    ///
    /// The text is normalized into space-joined words, then matched against
    /// every node. A matching node pulls its grants into the working set
    /// without re-testing them against the text. A path is satisfied iff all
    /// of its nodes are in the working set; satisfied paths contribute a
    /// `path:root:child:...` tag plus the name of every node on them.
    pub fn matching_tags(&self, text: &str, language: &str) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        let normalized = normalize_words(text);
        if normalized.is_empty() {
            return tags;
        }

        let mut matched: HashSet<NodeId> = HashSet::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if node.matches(&normalized, language) {
                matched.insert(id);
                matched.extend(node.grants.iter().copied());
            }
        }

        let mut satisfied: HashSet<&TagPath> = HashSet::new();
        for &id in &matched {
            for path in &self.nodes[id].paths {
                if path.nodes.iter().all(|n| matched.contains(n)) {
                    satisfied.insert(path);
                }
            }
        }

        for path in satisfied {
            let names = self.path_names(path);
            tags.insert(format!("path:{}", names.join(":")));
            for name in names {
                tags.insert(name.to_string());
            }
        }

        debug!(
            "Text [{}..] matches tags: {}",
            normalized.chars().take(20).collect::<String>(),
            tags.iter().cloned().collect::<Vec<_>>().join(" ")
        );
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_list(name: &str, parents: &[&str], grants: &[&str], words: &[&str]) -> KeywordList {
        let mut content = String::new();
        if !parents.is_empty() {
            content.push_str(&format!("# parents: {}\n", parents.join(", ")));
        }
        if !grants.is_empty() {
            content.push_str(&format!("# grants: {}\n", grants.join(", ")));
        }
        for word in words {
            content.push_str(word);
            content.push('\n');
        }
        KeywordList::parse(name, false, &content, "test").unwrap()
    }

    fn fixture_tree() -> Tree {
        Tree::build(vec![
            make_list("fashion", &[], &[], &["fashion"]),
            make_list("bags", &["fashion"], &[], &["bag", "handbag", "sv:väska"]),
            make_list("glasses", &["fashion"], &[], &["glasses", "sv:solglasögon"]),
            make_list("shoes", &["fashion"], &[], &["shoes", "sv:skor"]),
            make_list(
                "louisvuitton",
                &["bags", "glasses", "shoes"],
                &["fashion"],
                &["louis vuitton", "vuitton", "lv"],
            ),
            make_list(
                "louisvuittonspeedy",
                &["louisvuitton"],
                &["bags", "fashion"],
                &["speedy"],
            ),
            make_list("design", &[], &[], &["design"]),
            make_list(
                "svenskttenn",
                &["design"],
                &["design"],
                &["svenskt tenn"],
            ),
        ])
        .unwrap()
    }

    fn tag_set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_node_matching() {
        let tree = fixture_tree();
        let node = tree.get("louisvuitton").unwrap();
        assert!(node.matches("louis vuitton bag", "en"));
        assert!(node.matches("vuitton", "en"));
        assert!(!node.matches("gucci bag", "en"));
    }

    #[test]
    fn test_edges_and_paths() {
        let tree = fixture_tree();

        let lv = tree.get("louisvuitton").unwrap();
        let mut parents: Vec<&str> = lv.parents.iter().map(|&p| tree.node(p).name.as_str()).collect();
        parents.sort();
        assert_eq!(parents, vec!["bags", "glasses", "shoes"]);

        let grants: Vec<&str> = lv.grants.iter().map(|&g| tree.node(g).name.as_str()).collect();
        assert_eq!(grants, vec!["fashion"]);

        // One path per parent chain, through a multi-parent diamond
        let mut paths: Vec<String> = lv
            .paths
            .iter()
            .map(|p| tree.path_names(p).join(":"))
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "fashion:bags:louisvuitton",
                "fashion:glasses:louisvuitton",
                "fashion:shoes:louisvuitton",
            ]
        );

        let speedy = tree.get("louisvuittonspeedy").unwrap();
        assert_eq!(speedy.paths.len(), 3);
        let mut paths: Vec<String> = speedy
            .paths
            .iter()
            .map(|p| tree.path_names(p).join(":"))
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "fashion:bags:louisvuitton:louisvuittonspeedy",
                "fashion:glasses:louisvuitton:louisvuittonspeedy",
                "fashion:shoes:louisvuitton:louisvuittonspeedy",
            ]
        );
    }

    #[test]
    fn test_matching_tags_with_grants() {
        let tree = fixture_tree();

        // "fashion" is never matched directly but is granted by louisvuitton,
        // which satisfies the fashion:bags:louisvuitton path.
        let tags = tree.matching_tags("Äkta Louis Vuitton väska, knappt använd!", "sv");
        assert_eq!(
            tags,
            tag_set(&[
                "bags",
                "fashion",
                "louisvuitton",
                "path:fashion",
                "path:fashion:bags",
                "path:fashion:bags:louisvuitton",
            ])
        );
    }

    #[test]
    fn test_grant_only_path_satisfaction() {
        let tree = fixture_tree();

        // Speedy grants both bags and fashion: the whole chain lights up
        // even though neither "bag" nor "fashion" appears in the text.
        let tags = tree.matching_tags("Louis Vuitton Speedy 30 i perfekt skick", "sv");
        assert!(tags.contains("louisvuittonspeedy"));
        assert!(tags.contains("bags"));
        assert!(tags.contains("fashion"));
        assert!(tags.contains("path:fashion:bags:louisvuitton:louisvuittonspeedy"));
        // Glasses and shoes were neither matched nor granted
        assert!(!tags.contains("glasses"));
        assert!(!tags.contains("path:fashion:shoes:louisvuitton"));
    }

    #[test]
    fn test_child_match_without_root_yields_nothing() {
        let tree = fixture_tree();

        // "bags" matches but nothing pulls "fashion" into the working set,
        // so no path is satisfied and no tags are emitted.
        assert!(tree.matching_tags("Fin väska säljes", "sv").is_empty());

        // Same text in the wrong language does not even match "bags"
        assert!(tree.matching_tags("Fin väska säljes", "en").is_empty());
    }

    #[test]
    fn test_matching_tags_disjoint_subtrees() {
        let tree = fixture_tree();
        let tags = tree.matching_tags("Svenskt tenn karmstol och en Louis Vuitton väska", "sv");
        // Two unrelated subtrees both show up in one result
        assert_eq!(
            tags,
            tag_set(&[
                "bags",
                "design",
                "fashion",
                "louisvuitton",
                "path:design",
                "path:design:svenskttenn",
                "path:fashion",
                "path:fashion:bags",
                "path:fashion:bags:louisvuitton",
                "svenskttenn",
            ])
        );
    }

    #[test]
    fn test_matching_tags_no_match_and_idempotence() {
        let tree = fixture_tree();
        assert!(tree.matching_tags("nothing relevant here", "en").is_empty());
        assert!(tree.matching_tags("12 34 !!", "en").is_empty());

        let text = "Louis Vuitton speedy väska";
        let first = tree.matching_tags(text, "sv");
        let second = tree.matching_tags(text, "sv");
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_parent_reference() {
        let err = Tree::build(vec![make_list("bags", &["nosuch"], &[], &["bag"])]).unwrap_err();
        match err {
            AppError::UnknownTagReference { name, referenced_by } => {
                assert_eq!(name, "nosuch");
                assert_eq!(referenced_by, "bags");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_grant_reference() {
        let err = Tree::build(vec![
            make_list("fashion", &[], &[], &["fashion"]),
            make_list("bags", &["fashion"], &["nosuch"], &["bag"]),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::UnknownTagReference { .. }));
    }

    #[test]
    fn test_cycle_detection() {
        let err = Tree::build(vec![
            make_list("a", &["b"], &[], &["aa"]),
            make_list("b", &["a"], &[], &["bb"]),
        ])
        .unwrap_err();
        match err {
            AppError::CyclicTagGraph { chain } => assert!(chain.contains("->")),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn write_fixture_dir(dir: &std::path::Path) {
        let files: &[(&str, &str)] = &[
            ("fashion.txt", "fashion\n"),
            ("bags.txt", "# parents: fashion\nbag\nsv:väska\n"),
            (
                "louisvuitton.txt",
                "# parents: bags\n# grants: fashion\nlouis vuitton\nvuitton\n",
            ),
            (
                "rorstrand.html",
                "# parents: fashion\nr&ouml;rstrand\n",
            ),
        ];
        for (name, content) in files {
            let mut f = fs::File::create(dir.join(name)).unwrap();
            f.write_all(content.as_bytes()).unwrap();
        }
        // Ignored: neither .txt nor .html
        fs::File::create(dir.join("README.md")).unwrap();
    }

    #[test]
    fn test_load_from_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_fixture_dir(tmp.path());

        let tree = Tree::load(tmp.path()).unwrap();
        assert_eq!(tree.len(), 4);
        // HTML resource was entity-decoded at load time
        let node = tree.get("rorstrand").unwrap();
        assert_eq!(node.keywords[0].word, "rörstrand");
    }

    #[test]
    fn test_load_determinism() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_fixture_dir(tmp.path());

        let a = Tree::load(tmp.path()).unwrap();
        let b = Tree::load(tmp.path()).unwrap();

        assert_eq!(a.len(), b.len());
        for node_a in a.nodes() {
            let node_b = b.get(&node_a.name).unwrap();
            let edges = |tree: &Tree, ids: &[NodeId]| -> Vec<String> {
                ids.iter().map(|&i| tree.node(i).name.to_string()).collect()
            };
            assert_eq!(edges(&a, &node_a.parents), edges(&b, &node_b.parents));
            assert_eq!(edges(&a, &node_a.grants), edges(&b, &node_b.grants));
            let paths = |tree: &Tree, node: &Node| -> Vec<String> {
                node.paths.iter().map(|p| tree.path_names(p).join(":")).collect()
            };
            assert_eq!(paths(&a, node_a), paths(&b, node_b));
        }
    }
}
