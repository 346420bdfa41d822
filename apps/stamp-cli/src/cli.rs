//! Command-line surface

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use stamp_core::ScreenBox;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;

#[derive(Parser, Debug)]
#[command(name = "stamp-cli")]
#[command(version, about = "Stamp a signature image onto every page of a PDF")]
pub struct Cli {
    /// Gateway configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the stamping service is reachable
    Health,
    /// Preview the draft stamp, then save the signature on every page
    Sign(SignArgs),
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// PDF to sign
    #[arg(long)]
    pub pdf: PathBuf,

    /// Signature image (PNG, JPEG, GIF or WebP)
    #[arg(long)]
    pub image: PathBuf,

    /// Zoom the placement geometry is expressed at
    #[arg(long, default_value_t = 1.0, value_parser = parse_zoom)]
    pub zoom: f64,

    /// Draft placement on page 1 as x,y,width,height
    #[arg(long, value_parser = parse_box)]
    pub at: Option<ScreenBox>,

    /// Placement for one page of the final document as PAGE:x,y,width,height
    #[arg(long = "page", value_parser = parse_page_override)]
    pub pages: Vec<PageOverride>,

    /// Where to write the signed PDF
    #[arg(short, long, default_value = "signed.pdf")]
    pub out: PathBuf,

    /// Also write the single-stamp preview here
    #[arg(long)]
    pub preview_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageOverride {
    pub page: u32,
    pub bounds: ScreenBox,
}

pub fn parse_zoom(s: &str) -> Result<f64, String> {
    let zoom: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        return Err(format!(
            "zoom must be between {} and {}, got {}",
            MIN_ZOOM, MAX_ZOOM, zoom
        ));
    }
    Ok(zoom)
}

pub fn parse_box(s: &str) -> Result<ScreenBox, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid box '{}': {}", s, e))?;

    match values[..] {
        [x, y, width, height] if values.iter().all(|v| v.is_finite()) => {
            Ok(ScreenBox::new(x, y, width, height))
        }
        _ => Err(format!(
            "expected four finite numbers x,y,width,height, got '{}'",
            s
        )),
    }
}

pub fn parse_page_override(s: &str) -> Result<PageOverride, String> {
    let (page, bounds) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PAGE:x,y,width,height, got '{}'", s))?;
    let page: u32 = page
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number '{}'", page))?;
    if page == 0 {
        return Err("page numbers start at 1".to_string());
    }
    Ok(PageOverride {
        page,
        bounds: parse_box(bounds)?,
    })
}

/// Content type for the signature upload, from the file extension
pub fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zoom_range_is_inclusive() {
        assert_eq!(parse_zoom("0.5"), Ok(0.5));
        assert_eq!(parse_zoom("2"), Ok(2.0));
        assert!(parse_zoom("0.4").is_err());
        assert!(parse_zoom("2.1").is_err());
        assert!(parse_zoom("fast").is_err());
    }

    #[test]
    fn test_parse_box() {
        assert_eq!(
            parse_box("80, 80, 150, 70"),
            Ok(ScreenBox::new(80.0, 80.0, 150.0, 70.0))
        );
        assert!(parse_box("1,2,3").is_err());
        assert!(parse_box("1,2,3,x").is_err());
        assert!(parse_box("1,2,3,inf").is_err());
    }

    #[test]
    fn test_parse_page_override() {
        assert_eq!(
            parse_page_override("2:80,80,150,70"),
            Ok(PageOverride {
                page: 2,
                bounds: ScreenBox::new(80.0, 80.0, 150.0, 70.0),
            })
        );
        assert!(parse_page_override("0:1,1,20,20").is_err());
        assert!(parse_page_override("80,80,150,70").is_err());
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(Path::new("sig.PNG")), "image/png");
        assert_eq!(image_content_type(Path::new("sig.jpeg")), "image/jpeg");
        assert_eq!(
            image_content_type(Path::new("signature")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_sign_defaults() {
        let cli = Cli::try_parse_from([
            "stamp-cli",
            "sign",
            "--pdf",
            "lease.pdf",
            "--image",
            "sig.png",
            "--page",
            "2:80,80,150,70",
            "--page",
            "3:10,10,20,20",
        ])
        .unwrap();

        let Command::Sign(args) = cli.command else {
            panic!("expected sign subcommand");
        };
        assert_eq!(args.zoom, 1.0);
        assert_eq!(args.out, PathBuf::from("signed.pdf"));
        assert_eq!(args.at, None);
        assert_eq!(args.pages.len(), 2);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from(["stamp-cli", "health", "--config", "stamp.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Health));
        assert_eq!(cli.config, Some(PathBuf::from("stamp.toml")));
    }
}
