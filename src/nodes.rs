use crate::handlers::http_client;
use anyhow::{bail, Context as AnyhowContext};
use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    Client, Url,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

/// Where the node list lives when no URL is given.
pub const DEFAULT_NODE_LIST_PATH: &str = "/assets/nodelist.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub provider: String,
    #[serde(default)]
    pub connections: Vec<String>,
}

/// A node stripped of its coordinates and links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeeringLocation {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl From<&NetworkNode> for PeeringLocation {
    fn from(node: &NetworkNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            provider: node.provider.clone(),
            kind: node.kind,
        }
    }
}

/// Something that can load a node list.
#[async_trait(?Send)]
pub trait NodeSource {
    /// Loads the list from `location`, or from the source's default when `None`.
    async fn fetch_nodes(&self, location: Option<&str>) -> anyhow::Result<Vec<NetworkNode>>;
}

/// Loads the node list over HTTP. Relative locations resolve against `origin`.
pub struct HttpNodeSource {
    client: Client,
    origin: String,
    user_agent: String,
}

impl HttpNodeSource {
    pub fn new(origin: impl Into<String>, user_agent: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            origin: origin.into(),
            user_agent: user_agent.into(),
        })
    }

    fn resolve(&self, location: Option<&str>) -> anyhow::Result<Url> {
        let location = location.unwrap_or(DEFAULT_NODE_LIST_PATH);
        let origin = Url::parse(&self.origin)
            .with_context(|| format!("Invalid node list origin: {}", self.origin))?;
        origin
            .join(location)
            .with_context(|| format!("Invalid node list location: {}", location))
    }
}

#[async_trait(?Send)]
impl NodeSource for HttpNodeSource {
    async fn fetch_nodes(&self, location: Option<&str>) -> anyhow::Result<Vec<NetworkNode>> {
        let url = self.resolve(location)?;

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to fetch node list from {}", url))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            bail!("HTTP error! status: {}", status);
        }

        let text = response
            .text()
            .await
            .context("Failed to read node list body")?;
        serde_json::from_str(&text).context("Node list is not a valid JSON node array")
    }
}

/// Caller-owned node list with a loading flag. A failed refresh falls back to
/// [`fallback_nodes`] instead of leaving the list empty.
///
/// Not `Sync`; one directory belongs to one single-threaded owner.
pub struct NodeDirectory<S> {
    source: S,
    nodes: RefCell<Vec<NetworkNode>>,
    loading: Cell<bool>,
}

/// Clears the loading flag even if the refresh future is dropped mid-flight.
struct LoadingGuard<'a>(&'a Cell<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<S: NodeSource> NodeDirectory<S> {
    /// Starts out holding the fallback snapshot.
    pub fn new(source: S) -> Self {
        Self {
            source,
            nodes: RefCell::new(fallback_nodes()),
            loading: Cell::new(false),
        }
    }

    /// Reloads the node list and returns the result.
    ///
    /// A call made while another refresh is in flight returns the current snapshot
    /// without fetching. Fetch failures and empty lists install the fallback.
    pub async fn refresh(&self, location: Option<&str>) -> Vec<NetworkNode> {
        if self.loading.get() {
            return self.get();
        }

        self.loading.set(true);
        let _guard = LoadingGuard(&self.loading);

        let nodes = match self.source.fetch_nodes(location).await {
            Ok(nodes) if !nodes.is_empty() => nodes,
            Ok(_) => {
                log_error!("Node list is empty, using fallback nodes");
                fallback_nodes()
            }
            Err(e) => {
                log_error!("Failed to fetch network nodes: {:#}", e);
                fallback_nodes()
            }
        };

        *self.nodes.borrow_mut() = nodes.clone();
        nodes
    }

    pub fn get(&self) -> Vec<NetworkNode> {
        self.nodes.borrow().clone()
    }

    pub fn peering_locations(&self) -> Vec<PeeringLocation> {
        self.nodes.borrow().iter().map(PeeringLocation::from).collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }
}

fn node(
    id: &str,
    name: &str,
    lat: f64,
    lng: f64,
    kind: NodeKind,
    provider: &str,
    connections: &[&str],
) -> NetworkNode {
    NetworkNode {
        id: id.to_string(),
        name: name.to_string(),
        lat,
        lng,
        kind,
        provider: provider.to_string(),
        connections: connections.iter().map(|c| c.to_string()).collect(),
    }
}

/// Built-in snapshot used whenever the node list cannot be loaded.
pub fn fallback_nodes() -> Vec<NetworkNode> {
    use NodeKind::{Primary, Secondary};

    vec![
        node(
            "locix-frankfurt",
            "Frankfurt, Germany",
            50.1109,
            8.6821,
            Primary,
            "DataCenter One",
            &["amsterdam", "london", "hongkong"],
        ),
        node(
            "amsterdam",
            "Amsterdam, Netherlands",
            52.3676,
            4.9041,
            Secondary,
            "AMS-IX",
            &["locix-frankfurt"],
        ),
        node(
            "london",
            "London, United Kingdom",
            51.5074,
            -0.1278,
            Secondary,
            "LINX",
            &["locix-frankfurt"],
        ),
        node(
            "tokyo",
            "Tokyo, Japan",
            35.6762,
            139.6503,
            Secondary,
            "JPIX",
            &["locix-frankfurt"],
        ),
        node(
            "singapore",
            "Singapore",
            1.3521,
            103.8198,
            Secondary,
            "SGIX",
            &["hongkong"],
        ),
        node(
            "hongkong",
            "Hong Kong",
            22.3193,
            114.1694,
            Primary,
            "HKIX",
            &["locix-frankfurt", "tokyo", "singapore"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    enum Outcome {
        Nodes(Vec<NetworkNode>),
        Fail(&'static str),
    }

    struct ScriptedSource {
        outcome: Outcome,
        requested: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl NodeSource for ScriptedSource {
        async fn fetch_nodes(&self, location: Option<&str>) -> anyhow::Result<Vec<NetworkNode>> {
            self.requested.borrow_mut().push(location.map(str::to_string));
            tokio::task::yield_now().await;
            match &self.outcome {
                Outcome::Nodes(nodes) => Ok(nodes.clone()),
                Outcome::Fail(reason) => bail!("{}", reason),
            }
        }
    }

    fn custom_nodes() -> Vec<NetworkNode> {
        vec![node(
            "zurich",
            "Zurich, Switzerland",
            47.3769,
            8.5417,
            NodeKind::Primary,
            "SwissIX",
            &[],
        )]
    }

    #[test]
    fn test_fallback_dataset() {
        let nodes = fallback_nodes();
        assert_eq!(nodes.len(), 6);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        for node in &nodes {
            for link in &node.connections {
                assert!(ids.contains(&link.as_str()), "{} links to unknown {}", node.id, link);
            }
        }
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"[{"id":"a","name":"A","lat":1.5,"lng":-2.0,"type":"secondary","provider":"IX","connections":["b"]}]"#;
        let nodes: Vec<NetworkNode> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes[0].kind, NodeKind::Secondary);
        assert_eq!(nodes[0].connections, vec!["b"]);

        let value = serde_json::to_value(&nodes[0]).unwrap();
        assert_eq!(value["type"], "secondary");
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_nodes() {
        let directory = NodeDirectory::new(ScriptedSource::new(Outcome::Nodes(custom_nodes())));

        let nodes = directory.refresh(Some("https://example.net/nodes.json")).await;

        assert_eq!(nodes, custom_nodes());
        assert_eq!(directory.get(), custom_nodes());
        assert_eq!(directory.peering_locations()[0].provider, "SwissIX");
        assert!(!directory.is_loading());
        assert_eq!(
            *directory.source.requested.borrow(),
            vec![Some("https://example.net/nodes.json".to_string())]
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_uses_fallback() {
        let directory = NodeDirectory::new(ScriptedSource::new(Outcome::Fail("HTTP error! status: 500")));

        let nodes = directory.refresh(None).await;

        assert_eq!(nodes.len(), 6);
        assert_eq!(directory.get(), fallback_nodes());
        assert_eq!(directory.peering_locations().len(), 6);
        assert!(!directory.is_loading());
    }

    #[tokio::test]
    async fn test_refresh_failure_replaces_previous_nodes_with_fallback() {
        let mut directory = NodeDirectory::new(ScriptedSource::new(Outcome::Nodes(custom_nodes())));
        directory.refresh(None).await;
        directory.source = ScriptedSource::new(Outcome::Fail("connection reset"));

        let nodes = directory.refresh(None).await;

        assert_eq!(nodes, fallback_nodes());
    }

    #[tokio::test]
    async fn test_empty_list_uses_fallback() {
        let directory = NodeDirectory::new(ScriptedSource::new(Outcome::Nodes(Vec::new())));

        assert_eq!(directory.refresh(None).await.len(), 6);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_fetches_once() {
        let directory = NodeDirectory::new(ScriptedSource::new(Outcome::Nodes(custom_nodes())));

        let (first, second) = tokio::join!(directory.refresh(None), directory.refresh(None));

        assert_eq!(first, custom_nodes());
        assert_eq!(second, fallback_nodes());
        assert_eq!(directory.source.requested.borrow().len(), 1);
        assert_eq!(directory.get(), custom_nodes());
    }

    #[test]
    fn test_get_before_refresh_is_not_empty() {
        let directory = NodeDirectory::new(ScriptedSource::new(Outcome::Fail("unused")));
        assert_eq!(directory.get().len(), 6);
        assert!(!directory.is_loading());
    }

    #[tokio::test]
    async fn test_http_source_bad_origin_falls_back() {
        let source = HttpNodeSource::new("not a url", "Network-HomePage/1.0").unwrap();
        assert!(source.resolve(None).is_err());

        let directory = NodeDirectory::new(source);
        assert_eq!(directory.refresh(None).await, fallback_nodes());
    }

    #[test]
    fn test_http_source_resolves_relative_locations() {
        let source = HttpNodeSource::new("https://map.example.net/app/", "ua").unwrap();
        assert_eq!(
            source.resolve(None).unwrap().as_str(),
            "https://map.example.net/assets/nodelist.json"
        );
        assert_eq!(
            source.resolve(Some("https://cdn.example.org/n.json")).unwrap().as_str(),
            "https://cdn.example.org/n.json"
        );
    }

    #[tokio::test]
    async fn test_http_source_loads_served_list() {
        let body = r#"[{"id":"zurich","name":"Zurich, Switzerland","lat":47.3769,"lng":8.5417,"type":"primary","provider":"SwissIX"}]"#;
        let (origin, server) = serve_once("200 OK", body);
        let directory = NodeDirectory::new(HttpNodeSource::new(origin, "Network-HomePage/1.0").unwrap());

        assert_eq!(directory.refresh(None).await, custom_nodes());

        let seen = server.join().unwrap();
        assert_eq!(seen.request_line, "GET /assets/nodelist.json HTTP/1.1");
        assert_eq!(seen.header("user-agent"), Some("Network-HomePage/1.0"));
    }

    #[tokio::test]
    async fn test_http_source_not_found_falls_back() {
        let (origin, server) = serve_once("404 Not Found", r#"{"error":"missing"}"#);
        let directory = NodeDirectory::new(HttpNodeSource::new(origin, "Network-HomePage/1.0").unwrap());

        assert_eq!(directory.refresh(Some("/nodes.json")).await, fallback_nodes());
        assert!(!directory.is_loading());

        let seen = server.join().unwrap();
        assert_eq!(seen.request_line, "GET /nodes.json HTTP/1.1");
    }

    #[tokio::test]
    async fn test_http_source_connection_refused_falls_back() {
        let source = HttpNodeSource::new("http://127.0.0.1:1/", "Network-HomePage/1.0").unwrap();
        let directory = NodeDirectory::new(source);

        assert_eq!(directory.refresh(None).await, fallback_nodes());
        assert!(!directory.is_loading());
    }

    #[tokio::test]
    async fn test_http_source_non_array_body_falls_back() {
        let (origin, server) = serve_once("200 OK", r#"{"nodes": []}"#);
        let directory = NodeDirectory::new(HttpNodeSource::new(origin, "Network-HomePage/1.0").unwrap());

        assert_eq!(directory.refresh(None).await, fallback_nodes());
        server.join().unwrap();
    }

    #[tokio::test]
    async fn test_http_source_status_error_message() {
        let (origin, server) = serve_once("404 Not Found", "{}");
        let source = HttpNodeSource::new(origin, "Network-HomePage/1.0").unwrap();

        let err = source.fetch_nodes(None).await.unwrap_err();

        assert_eq!(err.to_string(), "HTTP error! status: 404");
        server.join().unwrap();
    }
}
