//! Heritage application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the SQLite database and load the chatbot rules
//! 3. Run an interactive chat session on stdin/stdout, with a few
//!    content commands for posts and comments

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use heritage_chat::{ChatError, ConversationSession, ResponseStore};
use heritage_content::{CommentService, LocalObjectStore, TracingNotifier, UploadPolicy, Uploader};
use heritage_core::config::HeritageConfig;
use heritage_core::locale::{Catalog, Translator};
use heritage_core::types::{BlogPost, Direction, Language};
use heritage_core::logging;
use heritage_storage::{BlogPostRepository, Database, RuleRepository};

use cli::CliArgs;

const HELP: &str = "Commands: /lang <en|fr|ar>, /open, /close, /toggle, /clear, /history, \
/reload, /post <title>, /posts, /comment <post-id> <text>, /upload <file> <content-type>, /quit";

/// What the REPL loop should do after a line.
enum Flow {
    Continue,
    Quit,
}

struct App {
    session: ConversationSession,
    store: Arc<ResponseStore>,
    rules: RuleRepository,
    posts: Arc<BlogPostRepository>,
    notifier: Arc<TracingNotifier>,
    translator: Arc<Catalog>,
    uploads: Arc<LocalObjectStore>,
    upload_policy: UploadPolicy,
    printed: usize,
}

impl App {
    async fn new(
        db: Arc<Database>,
        rules: RuleRepository,
        config: &HeritageConfig,
        data_dir: &Path,
        language: Language,
    ) -> Result<Self, ChatError> {
        let store = Arc::new(ResponseStore::load(&rules).await?);
        if store.is_empty() {
            tracing::warn!("No chatbot rules found; run with --seed to install the defaults");
        }
        let translator = Arc::new(Catalog::builtin());

        let mut session = ConversationSession::new(
            config.chat.clone(),
            Arc::clone(&store),
            translator.clone() as Arc<dyn Translator>,
        );
        session.open();
        session.initialize(language);

        let uploads_dir = data_dir.join("uploads");
        Ok(Self {
            session,
            store,
            rules,
            posts: Arc::new(BlogPostRepository::new(db)),
            notifier: Arc::new(TracingNotifier),
            translator,
            uploads: Arc::new(LocalObjectStore::new(
                &uploads_dir,
                format!("file://{}", uploads_dir.display()),
            )),
            upload_policy: UploadPolicy::from(&config.uploads),
            printed: 0,
        })
    }

    /// Run one REPL line. Command failures are logged and printed so the
    /// visitor can retry; only stdin errors end the loop.
    async fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => return Flow::Quit,
            "/help" => println!("{}", HELP),
            "/open" => self.session.open(),
            "/close" => self.session.close(),
            "/toggle" => {
                self.session.toggle();
                println!("chat is {:?}", self.session.state());
            }
            "/clear" => {
                self.session.clear();
                self.printed = 0;
            }
            "/history" => {
                for message in self.session.messages() {
                    print_message(&message.text, message.direction);
                }
            }
            "/lang" => match rest.parse::<Language>() {
                Ok(language) => {
                    self.session.set_language(language);
                    self.printed = 0;
                    for message in self.session.messages() {
                        print_message(&message.text, message.direction);
                    }
                    self.printed = self.session.messages().len();
                }
                Err(e) => println!("{}", e),
            },
            "/reload" => match self.store.reload(&self.rules).await {
                Ok(count) => println!("{} rules loaded", count),
                Err(e) => report("Failed to reload rules", &e),
            },
            "/post" if !rest.is_empty() => {
                let post = BlogPost::new(rest, "", "heritage-cli");
                match self.posts.save(&post) {
                    Ok(()) => println!("post {} created", post.id),
                    Err(e) => report("Failed to save post", &e),
                }
            }
            "/posts" => match self.posts.list(20) {
                Ok(posts) => {
                    for post in posts {
                        println!("{}  {} ({} comments)", post.id, post.title, post.comments.len());
                    }
                }
                Err(e) => report("Failed to list posts", &e),
            },
            "/comment" => {
                let Some((id, text)) = rest.split_once(' ') else {
                    println!("usage: /comment <post-id> <text>");
                    return Flow::Continue;
                };
                let parent_id = match Uuid::parse_str(id) {
                    Ok(id) => id,
                    Err(e) => {
                        println!("invalid post id: {}", e);
                        return Flow::Continue;
                    }
                };
                let service = CommentService::new(
                    self.posts.clone(),
                    self.notifier.clone(),
                    self.translator.clone(),
                )
                .with_language(self.session.language());
                // Failures are already reported through the notifier.
                if let Ok(comment) = service.submit(parent_id, text).await {
                    println!("comment {} awaiting moderation", comment.id);
                }
            }
            "/upload" => {
                let Some((path, content_type)) = rest.rsplit_once(' ') else {
                    println!("usage: /upload <file> <content-type>");
                    return Flow::Continue;
                };
                let bytes = match tokio::fs::read(path).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        println!("cannot read {}: {}", path, e);
                        return Flow::Continue;
                    }
                };
                let file_name = std::path::Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let uploader = Uploader::new(
                    self.upload_policy.clone(),
                    self.uploads.clone(),
                    self.notifier.clone(),
                    self.translator.clone(),
                )
                .with_language(self.session.language());
                match uploader.upload(&file_name, content_type, &bytes).await {
                    Ok(url) => println!("stored at {}", url),
                    Err(e) => println!("{}", e),
                }
            }
            _ if command.starts_with('/') => println!("{}", HELP),
            _ => {
                if !self.session.is_open() {
                    println!("chat is closed, /open to reopen");
                    return Flow::Continue;
                }
                if let Err(e) = self.session.send(line) {
                    println!("{}", e);
                }
                self.flush();
            }
        }
        Flow::Continue
    }

    /// Print messages appended since the last flush.
    fn flush(&mut self) {
        let messages = self.session.messages();
        if self.printed > messages.len() {
            self.printed = 0;
        }
        for message in &messages[self.printed..] {
            if message.direction == Direction::Incoming {
                print_message(&message.text, message.direction);
            }
        }
        self.printed = messages.len();
    }
}

fn report(context: &str, error: &dyn std::fmt::Display) {
    tracing::error!(error = %error, "{}", context);
    println!("{}: {}", context, error);
}

fn print_message(text: &str, direction: Direction) {
    match direction {
        Direction::Incoming => println!("bot> {}", text),
        Direction::Outgoing => println!("you> {}", text),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = HeritageConfig::load_or_default(&config_file);

    logging::init(&args.resolve_log_level(&config.general.log_level));
    tracing::info!("Starting Heritage v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("heritage.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let rules = RuleRepository::new(Arc::clone(&db));
    if args.seed {
        rules.seed_defaults()?;
    }

    let language = args.resolve_language(config.chat.default_language);
    let mut app = App::new(db, rules, &config, &data_dir, language).await?;
    app.flush();
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = app.handle_line(&line).await {
                    break;
                }
            }
            _ = tick.tick() => app.flush(),
        }
    }

    app.session.shutdown();
    tracing::info!("Heritage stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn app_with(db: Arc<Database>) -> App {
        let rules = RuleRepository::new(Arc::clone(&db));
        rules.seed_defaults().unwrap();
        App::new(
            db,
            rules,
            &HeritageConfig::default(),
            Path::new("/tmp/heritage-test"),
            Language::En,
        )
        .await
        .unwrap()
    }

    fn break_table(db: &Database, table: &str) {
        db.with_conn(|conn| {
            conn.execute_batch(&format!("DROP TABLE {}", table))
                .map_err(|e| heritage_core::HeritageError::Storage(e.to_string()))
        })
        .unwrap();
    }

    #[tokio::test]
    async fn test_storage_errors_keep_the_repl_running() {
        let db = Arc::new(Database::in_memory().unwrap());
        let mut app = app_with(Arc::clone(&db)).await;
        break_table(&db, "blog_posts");
        break_table(&db, "response_rules");

        assert!(matches!(app.handle_line("/posts").await, Flow::Continue));
        assert!(matches!(app.handle_line("/post Roman coins").await, Flow::Continue));
        assert!(matches!(app.handle_line("/reload").await, Flow::Continue));
        assert!(!app.store.is_empty());
        assert!(matches!(app.handle_line("/quit").await, Flow::Quit));
    }

    #[tokio::test]
    async fn test_post_then_list() {
        let db = Arc::new(Database::in_memory().unwrap());
        let mut app = app_with(Arc::clone(&db)).await;

        assert!(matches!(app.handle_line("/post Roman coins").await, Flow::Continue));
        let posts = app.posts.list(10).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Roman coins");
    }
}
