pub mod external;
pub mod mock;
pub mod types;

pub use external::FfmpegTools;
pub use mock::{MockClip, MockMediaTools};
pub use types::{
    ConcatRequest, Concatenator, MediaProbe, MediaTools, StreamSignature, ToolMode,
};

use crate::config::ToolsConfig;
use crate::error::StitchResult;
use tracing::debug;

pub fn open_media_tools(config: &ToolsConfig, verbose: bool) -> StitchResult<Box<dyn MediaTools>> {
    match config.mode {
        ToolMode::Mock => {
            debug!("using mock media tools");
            Ok(Box::new(MockMediaTools::new()))
        }
        ToolMode::Ffmpeg => {
            let tools = FfmpegTools::detect(
                config.ffmpeg_path.as_deref(),
                config.ffprobe_path.as_deref(),
            )?
            .with_verbose(verbose);
            tools.preflight()?;
            debug!(
                "using {} and {}",
                tools.ffmpeg_path().display(),
                tools.ffprobe_path().display()
            );
            Ok(Box::new(tools))
        }
    }
}
