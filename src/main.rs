use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sitekeeper::models::{
    Notice, NoticeInput, NoticeKey, NoticeRef, NoticeView, SearchField, Slide, ValidationError,
};
use sitekeeper::{AppError, AppResult, AttachmentChange, Backend, Settings, Site, SlideDeck};

#[derive(Parser)]
#[command(name = "sitekeeper", version, about = "Manage the banner slides and notice board of a static site")]
struct Cli {
    /// Directory all configured paths resolve against (overrides SITEKEEPER_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Store of record: html or snapshot (overrides SITEKEEPER_BACKEND)
    #[arg(long, global = true)]
    backend: Option<Backend>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Banner slides
    #[command(subcommand)]
    Banner(BannerCmd),
    /// Notice board
    #[command(subcommand)]
    Notice(NoticeCmd),
}

/// Positions are 1-based, as shown by `banner list`.
#[derive(Subcommand)]
enum BannerCmd {
    List,
    /// Copy a jpg/jpeg/png/mp4 into the media directory and append a slide
    Add {
        file: PathBuf,
        #[arg(long)]
        caption: Option<String>,
    },
    Caption { position: usize, text: String },
    MoveUp { position: usize },
    MoveDown { position: usize },
    /// Delete a slide and its media file
    Delete {
        position: usize,
        #[arg(long)]
        yes: bool,
    },
    /// Rewrite the banner snippet from the current slide list
    Render,
}

/// Either `--id`, or `--title` with `--date` (first match wins).
#[derive(Args)]
struct Target {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    id: Option<Uuid>,
}

impl Target {
    fn to_ref(&self) -> AppResult<NoticeRef> {
        match (&self.id, &self.title, &self.date) {
            (Some(id), _, _) => Ok(NoticeRef::Id(*id)),
            (None, Some(title), Some(date)) => Ok(NoticeRef::Key(NoticeKey::new(title.as_str(), date.as_str()))),
            _ => Err(ValidationError::Missing("--id or --title/--date").into()),
        }
    }
}

#[derive(Subcommand)]
enum NoticeCmd {
    /// All notices, newest date first
    List,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// YYYY/MM/DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "Normal")]
        badge: String,
        #[arg(long)]
        attach: Option<PathBuf>,
    },
    /// Rewrite a notice; fields not given keep their current value
    Edit {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        new_title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        new_date: Option<String>,
        #[arg(long)]
        badge: Option<String>,
        /// Replace the attachment (the old file is deleted)
        #[arg(long, conflicts_with = "detach")]
        attach: Option<PathBuf>,
        /// Drop the attachment and delete its file
        #[arg(long)]
        detach: bool,
    },
    Delete {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        yes: bool,
    },
    /// Field is one of title, date, badge, content
    Search { field: SearchField, term: String },
    Show {
        #[command(flatten)]
        target: Target,
    },
    /// Print the attachment path of a notice
    Attachment {
        #[command(flatten)]
        target: Target,
    },
}

fn main() -> ExitCode {
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("invalid configuration: {e:#}");
            return ExitCode::from(2);
        }
    };
    if let Some(root) = cli.root {
        settings.root = root;
    }
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }

    match run(settings, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(settings: Settings, command: Command) -> AppResult<()> {
    let site = Site::open(settings)?;
    match command {
        Command::Banner(cmd) => banner(&site, cmd),
        Command::Notice(cmd) => notice(&site, cmd),
    }
}

fn banner(site: &Site, cmd: BannerCmd) -> AppResult<()> {
    let mut editor = site.banner()?;
    match cmd {
        BannerCmd::List => {
            if editor.deck().is_empty() {
                println!("No slides.");
            }
            for (i, slide) in editor.deck().slides().iter().enumerate() {
                let missing = if editor.media_exists(slide) { "" } else { "  [media missing]" };
                println!("{}. {} ({}) - {}{missing}", i + 1, slide.file, slide.kind, slide.caption);
            }
            return Ok(());
        }
        BannerCmd::Add { file, caption } => {
            let slide = editor.add_slide(&file, caption.as_deref())?;
            println!("Added {} slide {}", slide.kind, slide.file);
        }
        BannerCmd::Caption { position, text } => {
            let deck = editor.deck_mut();
            select(deck, position)?;
            let slide = deck.set_caption(&text)?;
            println!("Caption of {} updated", slide.file);
        }
        BannerCmd::MoveUp { position } => {
            let deck = editor.deck_mut();
            select(deck, position)?;
            if !deck.move_up() {
                println!("Slide {position} is already first");
                return Ok(());
            }
            println!("Moved slide to position {}", deck.current_index() + 1);
        }
        BannerCmd::MoveDown { position } => {
            let deck = editor.deck_mut();
            select(deck, position)?;
            if !deck.move_down() {
                println!("Slide {position} is already last");
                return Ok(());
            }
            println!("Moved slide to position {}", deck.current_index() + 1);
        }
        BannerCmd::Delete { position, yes } => {
            let file = select(editor.deck_mut(), position)?.file.clone();
            let prompt = format!(
                "Delete slide {position} ({file})? This permanently removes the media file."
            );
            if !yes && !confirm(&prompt)? {
                return Err(AppError::Declined);
            }
            let removed = editor.delete_current()?;
            println!("Deleted slide {} and its media file", removed.file);
        }
        BannerCmd::Render => {}
    }
    editor.save()?;
    info!("banner saved ({} slide(s))", editor.deck().len());
    Ok(())
}

fn notice(site: &Site, cmd: NoticeCmd) -> AppResult<()> {
    let board = site.notices();
    match cmd {
        NoticeCmd::List => {
            let notices = board.list()?;
            if notices.is_empty() {
                println!("No notices found.");
            }
            for view in &notices {
                print_summary(view);
            }
            println!("({} notices)", notices.len());
        }
        NoticeCmd::Add { title, content, date, badge, attach } => {
            let input = NoticeInput { title, content, date, badge };
            let notice = board.submit(&input, attach.as_deref())?;
            match notice.file_name() {
                Some(name) => println!("Notice added with attachment {name} (id {})", notice.id),
                None => println!("Notice added (id {})", notice.id),
            }
        }
        NoticeCmd::Edit { target, new_title, content, new_date, badge, attach, detach } => {
            let current = board.find(&target.to_ref()?)?;
            let input = NoticeInput {
                title: new_title.unwrap_or_else(|| current.title.clone()),
                content: content.unwrap_or_else(|| current.content.clone()),
                date: new_date.unwrap_or_else(|| current.date.to_string()),
                badge: badge.unwrap_or_else(|| current.badge.to_string()),
            };
            let change = match (attach, detach) {
                (Some(path), _) => AttachmentChange::Replace(path),
                (None, true) => AttachmentChange::Remove,
                (None, false) => AttachmentChange::Keep,
            };
            let updated = board.edit(&NoticeRef::Id(current.id), &input, change)?;
            println!("Notice '{}' updated", updated.title);
        }
        NoticeCmd::Delete { target, yes } => {
            let current = board.find(&target.to_ref()?)?;
            let prompt = format!("Delete '{}' ({})?", current.title, current.date);
            if !yes && !confirm(&prompt)? {
                return Err(AppError::Declined);
            }
            board.remove(&NoticeRef::Id(current.id))?;
            println!("Notice deleted");
        }
        NoticeCmd::Search { field, term } => {
            let matches = board.search(field, &term)?;
            if matches.is_empty() {
                println!("No notices match {term:?}");
            }
            for notice in matches {
                print_summary(&board.view(notice));
            }
        }
        NoticeCmd::Show { target } => {
            let notice = board.find(&target.to_ref()?)?;
            print_full(&board.view(notice));
        }
        NoticeCmd::Attachment { target } => match board.attachment(&target.to_ref()?)? {
            None => println!("This notice has no attached file."),
            Some(att) if !att.exists => {
                println!("{} (file no longer exists)", att.path.display());
                return Err(AppError::NotFound);
            }
            Some(att) => println!("{}", att.path.display()),
        },
    }
    Ok(())
}

/// Selects by 1-based position.
fn select(deck: &mut SlideDeck, position: usize) -> AppResult<&Slide> {
    match position.checked_sub(1) {
        Some(index) => deck.select(index),
        None => Err(AppError::OutOfRange { position, len: deck.len() }),
    }
}

fn attachment_marker(view: &NoticeView) -> &'static str {
    match (view.has_file, view.file_exists) {
        (false, _) => "",
        (true, true) => "  [file]",
        (true, false) => "  [file missing]",
    }
}

fn print_summary(view: &NoticeView) {
    let n: &Notice = &view.notice;
    println!(
        "{}  {} {}  {}{}",
        n.date,
        n.badge.style().icon(),
        n.badge,
        n.title,
        attachment_marker(view)
    );
}

fn print_full(view: &NoticeView) {
    let n = &view.notice;
    println!("id:      {}", n.id);
    println!("title:   {}", n.title);
    println!("date:    {} (sort {})", n.date, n.date.sort_key());
    println!("badge:   {} {} [{}]", n.badge.style().icon(), n.badge, n.badge.style().class_pair());
    if let Some(created) = n.created_at {
        println!("created: {}", created.to_rfc3339());
    }
    match (&n.file_link, view.file_exists) {
        (Some(link), true) => println!("file:    {link}"),
        (Some(link), false) => println!("file:    {link} (missing)"),
        (None, _) => {}
    }
    println!();
    println!("{}", n.content);
}

fn confirm(prompt: &str) -> AppResult<bool> {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "{prompt} [y/N] ");
    let _ = stderr.flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return Ok(false);
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
