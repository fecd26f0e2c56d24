//! In-process fakes of WordPress and the OpenAI Assistants API for tests

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use assistant_client::{
    AssistantError, AssistantsClient, ChatRequest, CompletionProvider, OpenAIConfig,
};
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use cms_client::{CmsClient, CmsCredentials, TermKind, decode_html_entities};
use serde_json::{Value, json};

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// ============= Fake WordPress =============

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub content_type: String,
    pub disposition: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct CmsState {
    pub categories: Vec<(u64, String)>,
    pub tags: Vec<(u64, String)>,
    /// Ids handed out to newly created terms, by name
    pub preset_ids: HashMap<String, u64>,
    pub next_id: u64,
    /// Term names whose creation answers 500
    pub failing_terms: HashSet<String>,
    pub term_creates: usize,
    pub uploads: Vec<RecordedUpload>,
    pub media_status: u16,
    pub media_id: u64,
    pub posts: Vec<Value>,
    pub post_status: u16,
    pub post_link: String,
    pub image_bytes: Vec<u8>,
}

impl Default for CmsState {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            tags: Vec::new(),
            preset_ids: HashMap::new(),
            next_id: 100,
            failing_terms: HashSet::new(),
            term_creates: 0,
            uploads: Vec::new(),
            media_status: 201,
            media_id: 7,
            posts: Vec::new(),
            post_status: 201,
            post_link: "http://site/p/1".to_string(),
            image_bytes: b"\xFF\xD8\xFFFAKEJPEG".to_vec(),
        }
    }
}

impl CmsState {
    fn terms_mut(&mut self, kind: TermKind) -> &mut Vec<(u64, String)> {
        match kind {
            TermKind::Category => &mut self.categories,
            TermKind::Tag => &mut self.tags,
        }
    }
}

type SharedCms = Arc<Mutex<CmsState>>;
type TermQuery = Query<HashMap<String, String>>;

pub struct FakeCms {
    pub base_url: String,
    pub state: SharedCms,
}

impl FakeCms {
    pub async fn start(state: CmsState) -> Self {
        let state: SharedCms = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route(
                "/wp-json/wp/v2/categories",
                get(|s: State<SharedCms>, q: TermQuery| list_terms(TermKind::Category, s, q)).post(
                    |s: State<SharedCms>, b: Json<Value>| create_term(TermKind::Category, s, b),
                ),
            )
            .route(
                "/wp-json/wp/v2/tags",
                get(|s: State<SharedCms>, q: TermQuery| list_terms(TermKind::Tag, s, q))
                    .post(|s: State<SharedCms>, b: Json<Value>| create_term(TermKind::Tag, s, b)),
            )
            .route("/wp-json/wp/v2/media", post(upload_media))
            .route("/wp-json/wp/v2/posts", post(create_post))
            .route("/images/{name}", get(serve_image))
            .with_state(state.clone());

        Self {
            base_url: serve(app).await,
            state,
        }
    }

    pub fn client(&self) -> CmsClient {
        CmsClient::new(&self.base_url, CmsCredentials::new("editor", "app pass")).unwrap()
    }

    pub fn image_url(&self, name: &str) -> String {
        format!("{}/images/{}", self.base_url, name)
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, CmsState> {
        self.state.lock().unwrap()
    }
}

async fn list_terms(
    kind: TermKind,
    State(state): State<SharedCms>,
    Query(query): TermQuery,
) -> Json<Value> {
    let search = query.get("search").cloned().unwrap_or_default().to_lowercase();
    let mut state = state.lock().unwrap();
    let items: Vec<Value> = state
        .terms_mut(kind)
        .iter()
        // Names may be stored entity-encoded, as WordPress renders them
        .filter(|(_, name)| decode_html_entities(name).to_lowercase().contains(&search))
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    Json(Value::Array(items))
}

async fn create_term(
    kind: TermKind,
    State(state): State<SharedCms>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    state.term_creates += 1;

    if state.failing_terms.contains(&name) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "code": "db_insert_error",
                "message": "Could not insert term into the database."
            })),
        );
    }

    let preset = state.preset_ids.get(&name).copied();
    let id = match preset {
        Some(id) => id,
        None => {
            state.next_id += 1;
            state.next_id
        }
    };
    state.terms_mut(kind).push((id, name.clone()));
    (StatusCode::CREATED, Json(json!({"id": id, "name": name})))
}

async fn upload_media(
    State(state): State<SharedCms>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    let mut state = state.lock().unwrap();
    state.uploads.push(RecordedUpload {
        content_type: header("content-type"),
        disposition: header("content-disposition"),
        bytes: body.to_vec(),
    });

    let status = StatusCode::from_u16(state.media_status).unwrap();
    if status == StatusCode::CREATED {
        (
            status,
            Json(json!({
                "id": state.media_id,
                "source_url": "http://site/wp-content/uploads/featured.jpg"
            })),
        )
    } else {
        (status, Json(json!({"code": "rest_upload_unknown_error"})))
    }
}

async fn create_post(
    State(state): State<SharedCms>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.posts.push(body);

    // Any 2xx carries a post body so that only the status code differs
    let status = StatusCode::from_u16(state.post_status).unwrap();
    if status.is_success() {
        (status, Json(json!({"id": 1, "link": state.post_link})))
    } else {
        (
            status,
            Json(json!({
                "code": "rest_cannot_create",
                "message": "Sorry, you are not allowed to create posts as this user."
            })),
        )
    }
}

async fn serve_image(
    State(state): State<SharedCms>,
    Path(name): Path<String>,
) -> (StatusCode, Vec<u8>) {
    if name.starts_with("missing") {
        return (StatusCode::NOT_FOUND, Vec::new());
    }
    if name.starts_with("slow") {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    }
    (StatusCode::OK, state.lock().unwrap().image_bytes.clone())
}

// ============= Fake Assistants API =============

#[derive(Debug, Default)]
pub struct AgentState {
    /// Statuses returned by successive run retrievals; the last one repeats
    pub statuses: VecDeque<String>,
    pub last_error: Option<Value>,
    /// Thread messages, newest first
    pub messages: Vec<Value>,
    pub user_messages: Vec<String>,
    pub runs_created: Vec<Value>,
    pub retrieves: usize,
    pub cancels: usize,
    pub list_queries: Vec<HashMap<String, String>>,
    /// Thread creation never answers
    pub stall_threads: bool,
}

impl AgentState {
    pub fn with_statuses(statuses: &[&str]) -> Self {
        Self {
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn says(mut self, role: &str, text: &str) -> Self {
        self.messages.insert(
            0,
            json!({
                "id": format!("msg_{}", self.messages.len()),
                "role": role,
                "content": [{"type": "text", "text": {"value": text, "annotations": []}}]
            }),
        );
        self
    }

    pub fn assistant_says(self, text: &str) -> Self {
        self.says("assistant", text)
    }

    pub fn user_says(self, text: &str) -> Self {
        self.says("user", text)
    }
}

type SharedAgent = Arc<Mutex<AgentState>>;

pub struct FakeAssistants {
    pub base_url: String,
    pub state: SharedAgent,
}

impl FakeAssistants {
    pub async fn start(state: AgentState) -> Self {
        let state: SharedAgent = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/threads", post(create_thread))
            .route(
                "/threads/{thread_id}/messages",
                post(add_message).get(list_messages),
            )
            .route("/threads/{thread_id}/runs", post(create_run))
            .route("/threads/{thread_id}/runs/{run_id}", get(retrieve_run))
            .route("/threads/{thread_id}/runs/{run_id}/cancel", post(cancel_run))
            .with_state(state.clone());

        Self {
            base_url: serve(app).await,
            state,
        }
    }

    pub fn client(&self) -> AssistantsClient {
        AssistantsClient::new(OpenAIConfig::new("sk-test").with_api_base(&self.base_url)).unwrap()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, AgentState> {
        self.state.lock().unwrap()
    }
}

fn run_json(status: &str, last_error: Option<&Value>) -> Value {
    json!({
        "id": "run_1",
        "thread_id": "thread_1",
        "status": status,
        "last_error": last_error
    })
}

async fn create_thread(State(state): State<SharedAgent>) -> Json<Value> {
    let stall = state.lock().unwrap().stall_threads;
    if stall {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    }
    Json(json!({"id": "thread_1", "object": "thread"}))
}

async fn add_message(State(state): State<SharedAgent>, Json(body): Json<Value>) -> Json<Value> {
    let content = body["content"].as_str().unwrap_or_default().to_string();
    state.lock().unwrap().user_messages.push(content.clone());
    Json(json!({"id": "msg_user", "role": "user",
                "content": [{"type": "text", "text": {"value": content}}]}))
}

async fn list_messages(
    State(state): State<SharedAgent>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.list_queries.push(query);
    Json(json!({"object": "list", "data": state.messages}))
}

async fn create_run(State(state): State<SharedAgent>, Json(body): Json<Value>) -> Json<Value> {
    state.lock().unwrap().runs_created.push(body);
    Json(run_json("queued", None))
}

async fn retrieve_run(State(state): State<SharedAgent>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.retrieves += 1;
    let status = if state.statuses.len() > 1 {
        state.statuses.pop_front().unwrap_or_default()
    } else {
        state.statuses.front().cloned().unwrap_or_else(|| "completed".to_string())
    };
    Json(run_json(&status, state.last_error.as_ref()))
}

async fn cancel_run(State(state): State<SharedAgent>) -> Json<Value> {
    state.lock().unwrap().cancels += 1;
    Json(run_json("cancelling", None))
}

// ============= Completion stub =============

/// Returns a canned completion, or an API error when `reply` is `None`
pub struct StubProvider {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, AssistantError> {
        if let Some(msg) = request.messages.last() {
            self.prompts.lock().unwrap().push(msg.content.clone());
        }
        self.reply.clone().ok_or(AssistantError::ApiError {
            status: 503,
            message: "upstream overloaded".to_string(),
        })
    }
}
