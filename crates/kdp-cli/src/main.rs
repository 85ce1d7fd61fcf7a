mod logger;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kdp_layout::{
    AgeGroup, BookFormatter, BookMetadata, BookType, Content, CoverStyle, DimensionCalculator,
    FormatRequest, LayoutOptions, NewTemplate, PaperType, TemplateUpdate, TrimSize,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use logger::CliLogger;

#[derive(Parser)]
#[command(name = "kdpbook", about = "Print-ready KDP children's book layout", version)]
struct Cli {
    /// Layout options JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage root (overrides the config file)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Raster resolution for embedded images (overrides the config file)
    #[arg(long, global = true)]
    dpi: Option<u32>,

    /// Draw trim and bleed guides on covers
    #[arg(long, global = true)]
    debug_guides: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a complete book: cover, interior and print-ready PDF
    Format {
        /// Book metadata JSON file
        #[arg(short, long)]
        metadata: PathBuf,

        /// Book content JSON file
        #[arg(short, long)]
        content: PathBuf,

        /// Illustrations (story) or line art (coloring), in order
        #[arg(short, long, num_args = 1..)]
        images: Vec<PathBuf>,

        /// Template id to apply
        #[arg(short, long)]
        template: Option<String>,

        /// Front cover artwork
        #[arg(long)]
        cover_image: Option<PathBuf>,

        /// Cover style
        #[arg(long, default_value = "simple", value_enum)]
        style: StyleArg,
    },

    /// Generate only the wraparound cover
    Cover {
        /// Book metadata JSON file
        #[arg(short, long)]
        metadata: PathBuf,

        /// Front cover artwork
        #[arg(long)]
        cover_image: Option<PathBuf>,

        /// Cover style
        #[arg(long, default_value = "simple", value_enum)]
        style: StyleArg,
    },

    /// Print page and cover geometry as JSON
    Dimensions {
        /// Trim size
        #[arg(long, default_value = "standard", value_enum)]
        trim: TrimArg,

        /// Interior page count
        #[arg(long, default_value = "24")]
        pages: u32,

        /// Paper stock
        #[arg(long, default_value = "white", value_enum)]
        paper: PaperArg,
    },

    /// Manage book templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List templates, built-ins first
    List {
        /// Only templates for this book type
        #[arg(long, value_enum)]
        book_type: Option<BookTypeArg>,

        /// Only templates suitable for this age group
        #[arg(long, value_enum)]
        age: Option<AgeArg>,

        /// Only templates usable at this trim size
        #[arg(long, value_enum)]
        trim: Option<TrimArg>,
    },

    /// Print one template as JSON
    Show { id: String },

    /// Create a template from a JSON file
    Create {
        /// NewTemplate JSON file
        file: PathBuf,
    },

    /// Merge fields from a JSON file into a template
    Update {
        id: String,

        /// TemplateUpdate JSON file
        file: PathBuf,
    },

    /// Delete a template and its preview image
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Simple,
    Gradient,
    Photo,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrimArg {
    /// 8.5" x 11"
    Standard,
    /// 8.5" x 8.5"
    Square,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    White,
    Cream,
}

#[derive(Clone, Copy, ValueEnum)]
enum BookTypeArg {
    Story,
    Coloring,
}

#[derive(Clone, Copy, ValueEnum)]
enum AgeArg {
    #[value(name = "0-3")]
    Toddler,
    #[value(name = "3-5")]
    Preschool,
    #[value(name = "5-7")]
    EarlyReader,
    #[value(name = "7-12")]
    MiddleGrade,
}

impl From<StyleArg> for CoverStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Simple => Self::Simple,
            StyleArg::Gradient => Self::Gradient,
            StyleArg::Photo => Self::Photo,
        }
    }
}

impl From<TrimArg> for TrimSize {
    fn from(arg: TrimArg) -> Self {
        match arg {
            TrimArg::Standard => Self::Standard,
            TrimArg::Square => Self::Square,
        }
    }
}

impl From<PaperArg> for PaperType {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::White => Self::White,
            PaperArg::Cream => Self::Cream,
        }
    }
}

impl From<BookTypeArg> for BookType {
    fn from(arg: BookTypeArg) -> Self {
        match arg {
            BookTypeArg::Story => Self::Story,
            BookTypeArg::Coloring => Self::Coloring,
        }
    }
}

impl From<AgeArg> for AgeGroup {
    fn from(arg: AgeArg) -> Self {
        match arg {
            AgeArg::Toddler => Self::Toddler,
            AgeArg::Preschool => Self::Preschool,
            AgeArg::EarlyReader => Self::EarlyReader,
            AgeArg::MiddleGrade => Self::MiddleGrade,
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

async fn load_options(cli: &Cli) -> Result<LayoutOptions> {
    let mut options = match &cli.config {
        Some(path) => LayoutOptions::load(path).await?,
        None => LayoutOptions::default(),
    };
    if let Some(storage) = &cli.storage {
        options.storage_root = storage.clone();
    }
    if let Some(dpi) = cli.dpi {
        options.dpi = dpi;
    }
    if cli.debug_guides {
        options.debug_guides = true;
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logger = CliLogger::new(200, CliLogger::level_for_verbosity(cli.verbose)).init()?;

    let options = load_options(&cli).await?;

    match cli.command {
        Commands::Format {
            metadata,
            content,
            images,
            template,
            cover_image,
            style,
        } => {
            let metadata: BookMetadata = read_json(&metadata).await?;
            let content: Content = read_json(&content).await?;
            let formatter = BookFormatter::with_default_store(options)?;

            let mut request = FormatRequest::new(metadata, content)
                .with_images(images)
                .with_cover_style(style.into());
            if let Some(id) = template {
                request = request.with_template(id);
            }
            if let Some(path) = cover_image {
                request = request.with_cover_image(path);
            }

            let book = formatter.format_book(request).await?;
            println!("Interior: {} ({} pages)", book.interior_path.display(), book.interior_pages);
            if let Some(cover) = &book.cover_path {
                println!("Cover: {}", cover.display());
            }
            if let Some(template) = &book.template {
                println!("Template: {} ({})", template.name, template.id);
            }
            if book.is_degraded() {
                println!("Cover could not be attached; deliverable is the interior only");
                for entry in logger.problems() {
                    println!("  {}", entry.format_line());
                }
            }
            println!("Book → {}", book.path.display());
        }

        Commands::Cover {
            metadata,
            cover_image,
            style,
        } => {
            let metadata: BookMetadata = read_json(&metadata).await?;
            let formatter = BookFormatter::with_default_store(options)?;
            let path = formatter
                .generate_cover(metadata, cover_image, Some(style.into()))
                .await?;
            println!("Cover → {}", path.display());
        }

        Commands::Dimensions { trim, pages, paper } => {
            let calculator = DimensionCalculator::new(options.dpi);
            let cover = calculator.cover_dimensions(trim.into(), pages, paper.into());
            println!("{}", serde_json::to_string_pretty(&cover)?);
        }

        Commands::Templates { command } => {
            options.validate()?;
            let store = kdp_layout::TemplateStore::open(options.templates_dir())?;

            match command {
                TemplateCommands::List {
                    book_type,
                    age,
                    trim,
                } => {
                    store.ensure_builtin_templates()?;
                    let age = age.map(AgeGroup::from);
                    let trim = trim.map(TrimSize::from);
                    let templates = match book_type {
                        Some(book_type) => store.find_templates(book_type.into(), age, trim),
                        None => store
                            .list()
                            .into_iter()
                            .filter(|t| t.matches(age, trim))
                            .collect(),
                    };
                    for template in templates {
                        println!(
                            "{:<40} {:<9} {}",
                            template.id,
                            template.book_type.as_str(),
                            template.name
                        );
                    }
                }
                TemplateCommands::Show { id } => {
                    let template = store
                        .get_template(&id)
                        .with_context(|| format!("template {} not found", id))?;
                    println!("{}", serde_json::to_string_pretty(&template)?);
                }
                TemplateCommands::Create { file } => {
                    let new: NewTemplate = read_json(&file).await?;
                    let template = store.create_template(new)?;
                    println!("Created {}", template.id);
                }
                TemplateCommands::Update { id, file } => {
                    let update: TemplateUpdate = read_json(&file).await?;
                    let template = store.update_template(&id, update)?;
                    println!("Updated {} at {}", template.id, template.updated_at);
                }
                TemplateCommands::Delete { id } => {
                    if store.delete_template(&id)? {
                        println!("Deleted {}", id);
                    } else {
                        anyhow::bail!("template {} not found", id);
                    }
                }
            }
        }
    }

    Ok(())
}
