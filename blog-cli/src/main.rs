use std::sync::Arc;

use anyhow::Context;
use blog_posts::application::author_service::AuthorService;
use blog_posts::data::author_repository::PostgresAuthorRepository;
use blog_posts::data::post_repository::PostgresPostRepository;
use blog_posts::infrastructure::config::AppConfig;
use blog_posts::infrastructure::database::{create_pool, run_migrations};
use blog_posts::infrastructure::logging::init_logging;
use blog_posts::{IncludeMask, ListFilter, Pager, Post, PostService, PostType, PublishedStatus};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    /// Items per page; defaults to ITEMS_PER_PAGE.
    #[clap(long, global = true)]
    per_page: Option<usize>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Post,
    Page,
}

impl From<Kind> for PostType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Post => PostType::Post,
            Kind::Page => PostType::Page,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Status {
    Published,
    Drafts,
    Featured,
    All,
}

impl From<Status> for PublishedStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Published => PublishedStatus::Published,
            Status::Drafts => PublishedStatus::Drafts,
            Status::Featured => PublishedStatus::Featured,
            Status::All => PublishedStatus::All,
        }
    }
}

#[derive(Parser, Debug)]
enum Command {
    AddAuthor {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        admin: bool,
        #[clap(long)]
        avatar: Option<String>,
    },
    Add {
        #[clap(long)]
        author_id: i64,
        #[clap(long)]
        title: String,
        #[clap(long, default_value = "")]
        description: String,
        #[clap(long, default_value = "")]
        content: String,
        #[clap(long, default_value = "")]
        cover: String,
        #[clap(long, value_enum, default_value = "post")]
        kind: Kind,
        #[clap(long, value_delimiter = ',')]
        categories: Vec<String>,
        #[clap(long)]
        publish: bool,
    },
    Update {
        slug: String,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        content: Option<String>,
        #[clap(long)]
        cover: Option<String>,
    },
    Publish {
        id: i64,
        #[clap(long)]
        off: bool,
    },
    Feature {
        id: i64,
        #[clap(long)]
        off: bool,
    },
    Remove {
        id: i64,
    },
    Categories {
        id: i64,
        #[clap(value_delimiter = ',')]
        labels: Vec<String>,
    },
    Show {
        slug: String,
    },
    List {
        #[clap(long, default_value_t = 1)]
        page: usize,
        #[clap(long, default_value = "")]
        include: String,
        #[clap(long)]
        author_id: Option<i64>,
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        sanitize: bool,
    },
    Posts {
        #[clap(long, value_enum, default_value = "all")]
        status: Status,
        #[clap(long, value_enum, default_value = "post")]
        kind: Kind,
    },
    Popular {
        #[clap(long, default_value_t = 1)]
        page: usize,
        #[clap(long)]
        author_id: Option<i64>,
    },
    Search {
        term: String,
        #[clap(long, default_value_t = 1)]
        page: usize,
        #[clap(long, default_value = "")]
        include: String,
        #[clap(long)]
        author_id: Option<i64>,
        #[clap(long)]
        sanitize: bool,
    },
}

fn print(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_logging(config.log_format);

    let pool = create_pool(&config.database_url, config.max_connections)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let authors = Arc::new(PostgresAuthorRepository::new(pool.clone()));
    let posts = Arc::new(PostgresPostRepository::new(pool.clone()));
    let author_service = AuthorService::new(Arc::clone(&authors));
    let post_service = PostService::new(posts, authors);
    let per_page = args.per_page.unwrap_or(config.items_per_page);

    match args.command {
        Command::AddAuthor {
            name,
            email,
            admin,
            avatar,
        } => {
            let author = author_service
                .create_author(name, email, admin, avatar)
                .await?;
            print(&author)?;
        }
        Command::Add {
            author_id,
            title,
            description,
            content,
            cover,
            kind,
            categories,
            publish,
        } => {
            author_service.get_author(author_id).await?;
            let slug = post_service.generate_slug(&title, None).await?;
            let mut post = Post::new(author_id, slug, title, content);
            post.description = description;
            post.cover = cover;
            post.post_type = kind.into();

            let mut post = post_service.add(post).await?;
            if !categories.is_empty() {
                post_service.save_categories(post.id, &categories).await?;
            }
            if publish {
                post = post_service.publish(post.id, true).await?;
            }
            info!(post_id = post.id, "post added from cli");
            print(&post)?;
        }
        Command::Update {
            slug,
            title,
            description,
            content,
            cover,
        } => {
            let mut post = post_service
                .get_by_slug(&slug)
                .await?
                .with_context(|| format!("no post with slug {slug}"))?;
            if let Some(title) = title {
                post.title = title;
            }
            if let Some(description) = description {
                post.description = description;
            }
            if let Some(content) = content {
                post.content = content;
            }
            if let Some(cover) = cover {
                post.cover = cover;
            }
            print(&post_service.update(post).await?)?;
        }
        Command::Publish { id, off } => {
            print(&post_service.publish(id, !off).await?)?;
        }
        Command::Feature { id, off } => {
            print(&post_service.featured(id, !off).await?)?;
        }
        Command::Remove { id } => {
            post_service.remove(id).await?;
            println!("Post deleted!");
        }
        Command::Categories { id, labels } => {
            print(&post_service.save_categories(id, &labels).await?)?;
        }
        Command::Show { slug } => match post_service
            .get_post_model(&slug, config.related_posts)
            .await?
        {
            Some(model) => print(&model)?,
            None => println!("Post not found"),
        },
        Command::List {
            page,
            include,
            author_id,
            category,
            sanitize,
        } => {
            let mut pager = Pager::new(page, per_page);
            let filter = ListFilter {
                author_id,
                category,
                include: IncludeMask::parse(&include),
                sanitize,
            };
            let items = post_service.get_list(&mut pager, &filter).await?;
            print(&json!({ "pager": pager, "posts": items }))?;
        }
        Command::Posts { status, kind } => {
            let posts = post_service.get_posts(status.into(), kind.into()).await?;
            println!("Posts ({})", posts.len());
            for post in posts {
                println!("- [{}] {} ({})", post.id, post.title, post.slug);
            }
        }
        Command::Popular { page, author_id } => {
            let mut pager = Pager::new(page, per_page);
            let items = post_service.get_popular(&mut pager, author_id).await?;
            print(&json!({ "pager": pager, "posts": items }))?;
        }
        Command::Search {
            term,
            page,
            include,
            author_id,
            sanitize,
        } => {
            let mut pager = Pager::new(page, per_page);
            let filter = ListFilter {
                author_id,
                category: None,
                include: IncludeMask::parse(&include),
                sanitize,
            };
            let items = post_service.search(&mut pager, &term, &filter).await?;
            print(&json!({ "pager": pager, "posts": items }))?;
        }
    }

    Ok(())
}
