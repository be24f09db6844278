use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Habit {
    id: String,
    name: String,
    target_count: u32,
}

#[derive(Debug, Deserialize)]
struct HabitCard {
    id: String,
    name: String,
    today_count: u32,
    completed: bool,
    recent: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProgressEntry {
    habit_id: String,
    completed_count: u32,
}

#[derive(Debug, Deserialize)]
struct StepResponse {
    entry: ProgressEntry,
    just_completed: bool,
}

#[derive(Debug, Deserialize)]
struct DailyStats {
    total: usize,
    completed: usize,
    in_progress: usize,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    today: DailyStats,
    total_completions: usize,
    rollup: Vec<serde_json::Value>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habitflow_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/today")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_habitflow"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create_habit(client: &Client, base_url: &str, name: &str, target: u32) -> Habit {
    let response = client
        .post(format!("{base_url}/api/habits"))
        .json(&serde_json::json!({ "name": name, "target_count": target }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn stats(client: &Client, base_url: &str) -> StatsResponse {
    client
        .get(format!("{base_url}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn step(client: &Client, base_url: &str, id: &str, action: &str) -> StepResponse {
    let response = client
        .post(format!("{base_url}/api/habits/{id}/{action}"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_increment_completes_habit_for_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = stats(&client, &server.base_url).await;
    let habit = create_habit(&client, &server.base_url, "  Drink water ", 2).await;
    assert_eq!(habit.name, "Drink water");
    assert_eq!(habit.target_count, 2);

    let first = step(&client, &server.base_url, &habit.id, "increment").await;
    assert_eq!(first.entry.habit_id, habit.id);
    assert_eq!(first.entry.completed_count, 1);
    assert!(!first.just_completed);

    let mid = stats(&client, &server.base_url).await;
    assert_eq!(mid.today.total, before.today.total + 1);
    assert_eq!(mid.today.in_progress, before.today.in_progress + 1);

    let second = step(&client, &server.base_url, &habit.id, "increment").await;
    assert!(second.just_completed);

    let after = stats(&client, &server.base_url).await;
    assert_eq!(after.today.completed, before.today.completed + 1);
    assert_eq!(after.total_completions, before.total_completions + 1);
    assert_eq!(after.rollup.len(), 7);

    let cards: Vec<HabitCard> = client
        .get(format!("{}/api/habits?filter=completed&search=WATER", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let card = cards.iter().find(|card| card.id == habit.id).expect("missing habit card");
    assert_eq!(card.name, "Drink water");
    assert_eq!(card.today_count, 2);
    assert!(card.completed);
    assert_eq!(card.recent.len(), 7);
}

#[tokio::test]
async fn http_decrement_never_goes_below_zero() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let habit = create_habit(&client, &server.base_url, "Stretch", 1).await;
    let result = step(&client, &server.base_url, &habit.id, "decrement").await;
    assert_eq!(result.entry.completed_count, 0);
    assert!(!result.just_completed);
}

#[tokio::test]
async fn http_rejects_invalid_habits() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for body in [
        serde_json::json!({ "name": "   " }),
        serde_json::json!({ "name": "Run", "target_count": 0 }),
    ] {
        let response = client
            .post(format!("{}/api/habits", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn http_delete_removes_habit_and_progress() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let habit = create_habit(&client, &server.base_url, "Journal", 1).await;
    let upsert = client
        .post(format!("{}/api/progress", server.base_url))
        .json(&serde_json::json!({
            "habit_id": habit.id,
            "date": "2024-01-01",
            "completed_count": 3,
            "notes": "caught up"
        }))
        .send()
        .await
        .unwrap();
    assert!(upsert.status().is_success());

    let response = client
        .delete(format!("{}/api/habits/{}", server.base_url, habit.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let progress: Vec<ProgressEntry> = client
        .get(format!("{}/api/progress", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(progress.iter().all(|entry| entry.habit_id != habit.id));

    let missing = client
        .post(format!("{}/api/habits/{}/increment", server.base_url, habit.id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

async fn habit_names(client: &Client, base_url: &str, query: &str) -> Vec<String> {
    let cards: Vec<HabitCard> = client
        .get(format!("{base_url}/api/habits?{query}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    cards.into_iter().map(|card| card.name).collect()
}

#[tokio::test]
async fn http_update_patches_habit() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let habit = create_habit(&client, &server.base_url, "Meditate", 1).await;
    let url = format!("{}/api/habits/{}", server.base_url, habit.id);

    let updated: serde_json::Value = client
        .put(&url)
        .json(&serde_json::json!({ "target_count": 3, "description": "before bed", "frequency": "weekly" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["name"], "Meditate");
    assert_eq!(updated["target_count"], 3);
    assert_eq!(updated["description"], "before bed");
    assert_eq!(updated["frequency"], "weekly");

    for body in [
        serde_json::json!({ "name": "  " }),
        serde_json::json!({ "target_count": 0 }),
        serde_json::json!({ "color": "red\"><script>x</script>" }),
    ] {
        let response = client.put(&url).json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let missing = client
        .put(format!(
            "{}/api/habits/00000000-0000-0000-0000-000000000000",
            server.base_url
        ))
        .json(&serde_json::json!({ "target_count": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_today_shape() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let today: serde_json::Value = client
        .get(format!("{}/api/today", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(today["date"].as_str().map(str::len), Some(10));
    for key in ["total", "completed", "in_progress", "completion_rate"] {
        assert!(today[key].is_u64(), "{key} missing from {today}");
    }
    assert!(today["completion_rate"].as_u64().unwrap() <= 100);

    let stats = stats(&client, &server.base_url).await;
    assert_eq!(today["total"].as_u64(), Some(stats.today.total as u64));
    assert_eq!(today["completed"].as_u64(), Some(stats.today.completed as u64));
}

#[tokio::test]
async fn http_sort_orders_and_stats_ranges() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let older = create_habit(&client, &server.base_url, "Sortcheck older", 1).await;
    let newer = create_habit(&client, &server.base_url, "Sortcheck newer", 4).await;
    step(&client, &server.base_url, &older.id, "increment").await;
    step(&client, &server.base_url, &newer.id, "increment").await;

    let by_progress = habit_names(&client, &server.base_url, "sort_by=progress&search=sortcheck").await;
    assert_eq!(by_progress, ["Sortcheck older", "Sortcheck newer"]);
    let by_date = habit_names(&client, &server.base_url, "sort_by=date&search=SORTCHECK").await;
    assert_eq!(by_date, ["Sortcheck newer", "Sortcheck older"]);
    let pending = habit_names(&client, &server.base_url, "filter=pending&search=sortcheck").await;
    assert_eq!(pending, ["Sortcheck newer"]);

    let invalid = client
        .get(format!("{}/api/habits?sort_by=colour", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    for (range, expected) in [("week", 7), ("month", 30)] {
        let stats: StatsResponse = client
            .get(format!("{}/api/stats?range={range}", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats.rollup.len(), expected);
    }
}
