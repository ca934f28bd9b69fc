use std::{env, io, process};

use tracing_subscriber::EnvFilter;

use client::{
    LobbyTransport, SessionState,
    config,
    run::{self, LobbyExit},
    ui::TerminalUi,
};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let address = match config::room_address(env::args().skip(1)) {
        Ok(address) => address,
        Err(e) => {
            eprintln!("Error: invalid room address in environment: {}.", e);
            process::exit(1);
        }
    };

    let mut ui = match TerminalUi::new() {
        Ok(ui) => ui,
        Err(e) => {
            eprintln!("Error: failed to initialize terminal: {}.", e);
            process::exit(1);
        }
    };

    let outcome = run::run_lobby(&address, &mut ui);
    drop(ui);

    match outcome {
        Ok(LobbyExit::GameStarted(mut game)) => {
            println!("Game started in room \"{}\" at {}.", game.room.name, game.address);
            game.transport.disconnect();
            game.transport.pump(std::time::Duration::ZERO);
        }
        Ok(LobbyExit::Left) => println!("Left the lobby."),
        Ok(LobbyExit::Closed(SessionState::ClosedError { message })) => {
            eprintln!("Disconnected: {}", message);
            process::exit(1);
        }
        Ok(LobbyExit::Closed(_)) => println!("The room closed the connection."),
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    }
}
