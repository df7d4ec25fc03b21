//! Site menu.
//!
//! The menu is a static tree. For each request the tree is pruned so only
//! branches leading to the current page stay open, then flattened into one
//! row of links per open level.

use serde::Serialize;

pub struct NavNode {
    pub path: &'static str,
    /// `{username}` is replaced with the logged in user's name.
    pub title: &'static str,
    pub children: &'static [NavNode],
}

const fn leaf(path: &'static str, title: &'static str) -> NavNode {
    NavNode {
        path,
        title,
        children: &[],
    }
}

const RECIPES: NavNode = NavNode {
    path: "/recipes",
    title: "Recipes",
    children: &[
        leaf("/recipes", "All"),
        leaf("/recipes/categories", "Categories"),
        leaf("/recipes/search", "Search"),
    ],
};

pub const ANONYMOUS: &[NavNode] = &[
    leaf("/", "Ruokareseptit"),
    RECIPES,
    leaf("/auth/register", "Register"),
    leaf("/auth/login", "Log in"),
];

pub const LOGGED_IN: &[NavNode] = &[
    leaf("/", "Ruokareseptit"),
    RECIPES,
    NavNode {
        path: "/my/recipes",
        title: "Mine ({username})",
        children: &[
            leaf("/my/recipes", "Recipes"),
            leaf("/my/recipes/create", "New recipe"),
            leaf("/my/reviews", "Reviews"),
            leaf("/auth/logout", "Log out"),
        ],
    },
];

const LOGIN_PAGES: [&str; 2] = ["/auth/login", "/auth/register"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub title: String,
    pub url: String,
    pub current: bool,
    /// Submitted as a POST form instead of followed.
    pub post: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLevel {
    pub depth: usize,
    pub links: Vec<NavLink>,
}

struct Pruned<'t> {
    node: &'t NavNode,
    /// `Some` when the node is on the path to the current page.
    open: Option<Vec<Pruned<'t>>>,
}

fn prune<'t>(tree: &'t [NavNode], current: &str) -> (Vec<Pruned<'t>>, bool) {
    let mut any_match = false;
    let pruned = tree
        .iter()
        .map(|node| {
            let (subtree, sub_match) = prune(node.children, current);
            let open = (node.path == current || sub_match).then_some(subtree);
            any_match |= open.is_some();
            Pruned { node, open }
        })
        .collect();
    (pruned, any_match)
}

/// Where a request currently is, as the menu needs it.
pub struct Location<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub username: Option<&'a str>,
}

impl Location<'_> {
    /// The `next` value login and register links should carry.
    fn next_target(&self) -> Option<String> {
        if LOGIN_PAGES.contains(&self.path) {
            return self.query.and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(k, _)| k == "next")
                    .map(|(_, v)| v.into_owned())
            });
        }
        Some(match self.query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.to_string(),
        })
    }

    fn link(&self, node: &NavNode, current: bool) -> NavLink {
        let title = match self.username {
            Some(name) => node.title.replace("{username}", name),
            None => node.title.to_string(),
        };
        let url = match self.next_target() {
            Some(next) if LOGIN_PAGES.contains(&node.path) => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("next", &next)
                    .finish();
                format!("{}?{}", node.path, query)
            }
            _ => node.path.to_string(),
        };
        NavLink {
            title,
            url,
            current,
            post: node.path == "/auth/logout",
        }
    }

    fn flatten(&self, tree: &[Pruned<'_>], depth: usize, levels: &mut Vec<NavLevel>) {
        if tree.is_empty() {
            return;
        }
        let links = tree
            .iter()
            .map(|item| self.link(item.node, item.open.is_some()))
            .collect();
        levels.push(NavLevel { depth, links });

        // Only one branch can be open per level; the last one wins.
        if let Some(open) = tree.iter().rev().find_map(|item| item.open.as_ref()) {
            self.flatten(open, depth + 1, levels);
        }
    }
}

/// Menu levels for a request at `location`.
pub fn navigation(location: &Location<'_>) -> Vec<NavLevel> {
    let tree = if location.username.is_some() {
        LOGGED_IN
    } else {
        ANONYMOUS
    };
    let (pruned, _) = prune(tree, location.path);
    let mut levels = Vec::new();
    location.flatten(&pruned, 0, &mut levels);
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(level: &NavLevel) -> Vec<&str> {
        level.links.iter().map(|l| l.title.as_str()).collect()
    }

    fn at<'a>(path: &'a str, query: Option<&'a str>, username: Option<&'a str>) -> Vec<NavLevel> {
        navigation(&Location {
            path,
            query,
            username,
        })
    }

    #[test]
    fn home_shows_only_top_level() {
        let levels = at("/", None, None);
        assert_eq!(levels.len(), 1);
        assert_eq!(
            titles(&levels[0]),
            vec!["Ruokareseptit", "Recipes", "Register", "Log in"]
        );
        assert!(levels[0].links[0].current);
        assert!(!levels[0].links[1].current);
    }

    #[test]
    fn search_page_opens_recipes_branch() {
        let levels = at("/recipes/search", Some("q=soup"), None);
        assert_eq!(levels.len(), 2);
        assert!(levels[0].links[1].current);
        assert_eq!(levels[1].depth, 1);
        assert_eq!(titles(&levels[1]), vec!["All", "Categories", "Search"]);
        let current: Vec<_> = levels[1].links.iter().map(|l| l.current).collect();
        assert_eq!(current, vec![false, false, true]);
    }

    #[test]
    fn login_links_carry_current_page() {
        let levels = at("/recipes/search", Some("q=soup"), None);
        assert_eq!(
            levels[0].links[3].url,
            "/auth/login?next=%2Frecipes%2Fsearch%3Fq%3Dsoup"
        );
    }

    #[test]
    fn login_page_passes_next_through() {
        let levels = at("/auth/login", Some("next=%2Fmy%2Freviews"), None);
        assert_eq!(levels[0].links[2].url, "/auth/register?next=%2Fmy%2Freviews");
        assert!(levels[0].links[3].current);

        let levels = at("/auth/login", None, None);
        assert_eq!(levels[0].links[2].url, "/auth/register");
    }

    #[test]
    fn logged_in_menu_names_user() {
        let levels = at("/my/reviews", None, Some("alice"));
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].links[2].title, "Mine (alice)");
        assert!(levels[0].links[2].current);
        let logout = levels[1].links.last().unwrap();
        assert!(logout.post);
        assert_eq!(logout.url, "/auth/logout");
    }

    #[test]
    fn unknown_page_marks_nothing() {
        let levels = at("/recipes/12", None, None);
        assert_eq!(levels.len(), 1);
        assert!(levels[0].links.iter().all(|l| !l.current));
    }
}
