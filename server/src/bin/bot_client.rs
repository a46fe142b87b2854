//! Minimal CHaser client for manual testing and demo games.
//!
//! Plays one side against a running server using a greedy policy: capture an
//! adjacent opponent, otherwise grab an adjacent item, otherwise wander.

use chaser_server::transport::LineBuffer;
use chaser_shared::{
    Action, Cell, Command, Direction, Observation, DEFAULT_COOL_PORT, LINE_DELIMITER,
    READY_TOKEN, TURN_END_TOKEN, TURN_REQUEST_TOKEN,
};
use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::error::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port (40000 for cool, 50000 for hot)
    #[clap(short, long, default_value_t = DEFAULT_COOL_PORT)]
    port: u16,
    /// Team name sent during the handshake
    #[clap(short, long, default_value = "bot")]
    name: String,
    /// Seed for reproducible wandering
    #[clap(short, long)]
    seed: Option<u64>,
}

/// Picks the next command from the current surroundings.
fn choose_command(observation: &Observation, rng: &mut StdRng) -> Command {
    let neighbors = |cell: Cell| -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&d| observation.neighbor(d) == cell)
            .collect()
    };

    if let Some(&direction) = neighbors(Cell::Player).first() {
        return Command::new(Action::Put, direction);
    }
    if let Some(&direction) = neighbors(Cell::Item).first() {
        return Command::new(Action::Walk, direction);
    }
    match neighbors(Cell::Floor).choose(rng) {
        Some(&direction) => Command::new(Action::Walk, direction),
        None => Command::new(Action::Look, Direction::Up),
    }
}

struct Connection {
    stream: TcpStream,
    buffer: LineBuffer,
}

impl Connection {
    async fn send(&mut self, message: &str) -> Result<(), Box<dyn Error>> {
        let line = format!("{}{}", message, LINE_DELIMITER);
        self.stream.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Returns `None` once the server has closed the connection.
    async fn receive(&mut self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.buffer.read_line(&mut self.stream).await?)
    }

    async fn receive_observation(&mut self) -> Result<Option<Observation>, Box<dyn Error>> {
        match self.receive().await? {
            Some(line) => Ok(Some(line.parse()?)),
            None => Ok(None),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let address = format!("{}:{}", args.host, args.port);
    info!("Connecting to {}", address);
    let stream = TcpStream::connect(&address).await?;
    stream.set_nodelay(true)?;
    let mut conn = Connection {
        stream,
        buffer: LineBuffer::new(),
    };

    conn.send(&args.name).await?;
    conn.send(READY_TOKEN).await?;
    match conn.receive().await? {
        Some(ack) if ack == READY_TOKEN => info!("Game started as {}", args.name),
        Some(other) => return Err(format!("unexpected ready reply {:?}", other).into()),
        None => {
            info!("Server closed the connection before the game started");
            return Ok(());
        }
    }

    let mut turns = 0u32;
    loop {
        conn.send(TURN_REQUEST_TOKEN).await?;
        let observation = match conn.receive_observation().await? {
            Some(observation) if observation.running => observation,
            _ => break,
        };

        let command = choose_command(&observation, &mut rng);
        debug!("Observation {} -> {}", observation, command);
        conn.send(&command.to_string()).await?;

        let after = match conn.receive_observation().await? {
            Some(observation) => observation,
            None => break,
        };
        conn.send(TURN_END_TOKEN).await?;
        turns += 1;

        if !after.running {
            break;
        }
    }

    info!("Game over after {} turns", turns);
    Ok(())
}
