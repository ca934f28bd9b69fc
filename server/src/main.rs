use std::{io, process};

use tracing_subscriber::EnvFilter;

use server::{room, run};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    ctrlc::set_handler(move || {
        println!("Room closed.");
        process::exit(0);
    })
    .expect("error setting Ctrl-C handler");

    let private_key = common::net::private_key();
    let connectable_addr = match common::net::get_connectable_address() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: invalid IP or PORT in environment: {}.", e);
            process::exit(1);
        }
    };
    let bind_addr = run::binding_address(connectable_addr);

    let socket = match common::net::bind_socket(bind_addr) {
        Ok(socket) => {
            println!("Room listening on {}.", bind_addr);
            socket
        }
        Err(e) => {
            eprintln!("Error: Failed to bind socket.");
            eprintln!("Details: {}.", e);
            if e.kind() == io::ErrorKind::AddrInUse {
                eprintln!("Is another room already running on this port?");
            }
            process::exit(1);
        }
    };

    if let Err(e) = run::run_server(socket, connectable_addr, private_key, room::room_info_from_env())
    {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}
