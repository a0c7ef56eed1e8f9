//! gemmarks: prints the profile's bookmarks as a link-list page.
//!
//! Usage: `gemmarks [--by folder|tag|time] [--refresh] [--save]`
//!
//! `--refresh` runs one remote refresh round before printing; `--save`
//! writes the store back to the profile afterwards.

use gemmarks::app::App;
use gemmarks::services::link_list::bookmark_list_page;
use gemmarks::types::bookmark::BookmarkListType;
use gemmarks::types::event::Notifier;

use tracing::Level;

struct Options {
    list_type: BookmarkListType,
    refresh: bool,
    save: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        list_type: BookmarkListType::ByFolder,
        refresh: false,
        save: false,
    };
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--refresh" => options.refresh = true,
            "--save" => options.save = true,
            "--by" => {
                options.list_type = match args.next().as_deref() {
                    Some("folder") => BookmarkListType::ByFolder,
                    Some("tag") => BookmarkListType::ByTag,
                    Some("time") => BookmarkListType::ByCreationTime,
                    other => return Err(format!("--by expects folder, tag or time, got {:?}", other)),
                }
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(options)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("usage: gemmarks [--by folder|tag|time] [--refresh] [--save]");
            std::process::exit(2);
        }
    };

    let mut app = match App::from_environment(
        Notifier::disconnected(),
        tokio::runtime::Handle::current(),
    ) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("gemmarks: {}", err);
            std::process::exit(1);
        }
    };
    app.startup();

    if options.refresh && app.remote_sync.fetch_remote() {
        app.remote_sync.run_until_idle().await;
    }

    print!("{}", bookmark_list_page(&app.bookmarks, options.list_type));

    if options.save {
        if let Err(err) = app.save() {
            eprintln!("gemmarks: {}", err);
            std::process::exit(1);
        }
    }
}
