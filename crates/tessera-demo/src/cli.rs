use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use tessera_engine::render::RenderConfig;
use tessera_engine::resources::{SamplerConfig, TextureSource};

/// Checkerboard used when `--texture` is not given.
const CHECKER_SIZE: u32 = 256;
const CHECKER_CELL: u32 = 32;

#[derive(Parser, Debug)]
#[command(
    name = "tessera-demo",
    version,
    about = "Renders one of the built-in tessera scenes in a window"
)]
pub struct Cli {
    /// Scene to render.
    #[arg(long, value_enum, default_value_t = Variant::TexturedQuad)]
    pub variant: Variant,

    /// Image for the textured quad; a checkerboard is generated when omitted.
    /// Only valid with `--variant textured-quad`.
    #[arg(long, value_name = "PATH")]
    pub texture: Option<PathBuf>,

    /// Sample the texture with nearest filtering. Only valid with
    /// `--variant textured-quad`.
    #[arg(long)]
    pub pixel_art: bool,

    /// Window width in logical pixels.
    #[arg(long, value_name = "PX", default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Window height in logical pixels.
    #[arg(long, value_name = "PX", default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Log filter in `env_logger` syntax; falls back to `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

#[derive(ValueEnum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Variant {
    Triangle,
    ColoredQuad,
    TexturedQuad,
}

impl Cli {
    /// Parses the command line and exits with a usage error on flags the
    /// chosen variant cannot use.
    pub fn parse_checked() -> Self {
        let cli = Self::parse();
        if let Err(e) = cli.check() {
            e.exit();
        }
        cli
    }

    /// Rejects texture flags for variants that draw no texture.
    pub fn check(&self) -> Result<(), clap::Error> {
        if self.variant == Variant::TexturedQuad {
            return Ok(());
        }
        let flag = if self.texture.is_some() {
            "--texture"
        } else if self.pixel_art {
            "--pixel-art"
        } else {
            return Ok(());
        };
        Err(Self::command().error(
            ErrorKind::ArgumentConflict,
            format!("{flag} only applies to --variant textured-quad (got {:?})", self.variant),
        ))
    }

    pub fn render_config(&self) -> RenderConfig {
        match self.variant {
            Variant::Triangle => RenderConfig::triangle(),
            Variant::ColoredQuad => RenderConfig::colored_quad(),
            Variant::TexturedQuad => {
                let source = match &self.texture {
                    Some(path) => TextureSource::path(path),
                    None => TextureSource::checkerboard(CHECKER_SIZE, CHECKER_CELL),
                };
                let sampler = if self.pixel_art {
                    SamplerConfig::pixel_art()
                } else {
                    SamplerConfig::default()
                };
                RenderConfig::textured_quad(source).with_sampler(sampler)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_textured_checkerboard() {
        let cli = Cli::parse_from(["tessera-demo"]);
        assert_eq!(cli.variant, Variant::TexturedQuad);
        assert_eq!((cli.width, cli.height), (800, 600));

        let config = cli.render_config();
        let texture = config.texture.expect("textured quad binds a texture");
        assert!(matches!(texture.source, TextureSource::Rgba8 { width: 256, .. }));
    }

    #[test]
    fn variant_flag_selects_preset() {
        let cli = Cli::parse_from(["tessera-demo", "--variant", "colored-quad"]);
        assert_eq!(cli.render_config(), RenderConfig::colored_quad());

        let cli = Cli::parse_from(["tessera-demo", "--variant", "triangle", "--width", "320"]);
        assert_eq!(cli.render_config(), RenderConfig::triangle());
        assert_eq!(cli.width, 320);
    }

    #[test]
    fn texture_path_is_used() {
        let cli = Cli::parse_from(["tessera-demo", "--texture", "assets/tile.png", "--pixel-art"]);
        let texture = cli.render_config().texture.unwrap();
        assert_eq!(texture.source, TextureSource::path("assets/tile.png"));
        assert_eq!(texture.sampler, SamplerConfig::pixel_art());
    }

    #[test]
    fn texture_flags_require_textured_variant() {
        let cli = Cli::parse_from(["tessera-demo", "--variant", "triangle", "--texture", "a.png"]);
        let err = cli.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let cli = Cli::parse_from(["tessera-demo", "--variant", "colored-quad", "--pixel-art"]);
        assert!(cli.check().is_err());

        let cli = Cli::parse_from(["tessera-demo", "--texture", "a.png", "--pixel-art"]);
        assert!(cli.check().is_ok());
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(Cli::try_parse_from(["tessera-demo", "--width", "0"]).is_err());
    }
}
