use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use breakout_recommender::config::{GameParameter, PlayerParameter, RecommenderParameter};
use breakout_recommender::environment::paddle_game::{PaddleGame, PaddleGameVariant, FIELD_LEN_X, FIELD_LEN_Y};
use breakout_recommender::environment::GameEnvironment;
use breakout_recommender::player::frontend::{ConsoleFrontend, Frontend, HeadlessFrontend};
use breakout_recommender::player::Player;
use breakout_recommender::recommender::Recommender;
use breakout_recommender::session::run_training;
use breakout_recommender::util::init_logging;

#[derive(Parser, Debug)]
#[command(name = "breakout-recommender", about = "Paddle game played by you and/or a recommender agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play interactively, optionally assisted by a random recommender
    Play {
        #[command(flatten)]
        game: GameArgs,

        #[arg(long, value_enum, default_value_t = PolicyChoice::Random)]
        policy: PolicyChoice,
    },
    /// Let a learning driver explore one episode through the learning-system bridge
    Train {
        #[command(flatten)]
        game: GameArgs,

        /// Max. time to wait for the reward of a sent action
        #[arg(long, value_name = "ms", default_value_t = 1000)]
        reward_timeout_ms: u64,

        /// Stop exploring after that many steps
        #[arg(long)]
        max_steps: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct GameArgs {
    /// standard | wide-paddle | fast-ball
    #[arg(long, default_value_t = PaddleGameVariant::Standard)]
    game: PaddleGameVariant,

    #[arg(long)]
    debug: bool,

    /// Infinite lives
    #[arg(long)]
    cheat_mode: bool,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Run without a terminal and exit after that many frames
    #[arg(long)]
    headless_frames: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyChoice {
    Random,
    None,
}

impl GameArgs {
    fn game(&self) -> PaddleGame {
        PaddleGame::new(&GameParameter {
            variant: self.game,
            cheat_mode: self.cheat_mode,
            debug: self.debug,
        })
    }

    fn frontend(&self) -> Result<Box<dyn Frontend>> {
        Ok(match self.headless_frames {
            Some(frames) => Box::new(HeadlessFrontend::paced(Some(frames))),
            None => Box::new(ConsoleFrontend::new(FIELD_LEN_X, FIELD_LEN_Y, self.fps)?),
        })
    }

    fn player_param(&self) -> PlayerParameter {
        PlayerParameter {
            fps: self.fps,
            ..PlayerParameter::default()
        }
    }
}

fn print_banner(game: &GameArgs, mode: &str) {
    println!("Breakout recommender | {} | game: {}, {} fps", mode, game.game, game.fps);
    if game.headless_frames.is_none() {
        println!("Use the arrow keys to move the paddle, ESC to quit.");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let debug = match &cli.command {
        Command::Play { game, .. } | Command::Train { game, .. } => game.debug,
    };
    init_logging(if debug { LevelFilter::Debug } else { LevelFilter::Info });

    match cli.command {
        Command::Play { game, policy } => {
            print_banner(&game, "play");
            let env = game.game();
            let recommender = match policy {
                PolicyChoice::Random => Some(Recommender::random(env.action_space().clone(), &RecommenderParameter::default())?),
                PolicyChoice::None => None,
            };
            let mut frontend = game.frontend()?;
            let mut player = Player::new(env, recommender, game.player_param())?;
            let report = player.play(frontend.as_mut())?;
            log::info!("{}", report);
        }
        Command::Train {
            game,
            reward_timeout_ms,
            max_steps,
        } => {
            print_banner(&game, "train");
            let recommender_param = RecommenderParameter {
                reward_timeout: Duration::from_millis(reward_timeout_ms),
                ..RecommenderParameter::default()
            };
            let mut frontend = game.frontend()?;
            let report = run_training(game.game(), frontend.as_mut(), game.player_param(), &recommender_param, max_steps)?;
            log::info!("{}", report);
        }
    }
    Ok(())
}
