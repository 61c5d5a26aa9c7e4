use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sphere_client::media::SyntheticMediaDevices;
use sphere_client::signaling::WsSignaling;
use sphere_client::transport::RtcTransportFactory;
use sphere_client::{CallEngine, CallEvent, CallHandle, EngineConfig, NoticeLevel, RoomPhase};
use sphere_core::{Participant, RoomPrivacy, UserProfile};
use sphere_server::ServerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sphere", about = "Study room video calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(short, long, env = "SPHERE_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Join a room as a headless participant.
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:3000")]
        server: String,

        #[arg(short, long)]
        room: String,

        #[arg(short, long)]
        name: String,

        #[arg(long)]
        private: bool,

        #[arg(long)]
        muted: bool,

        #[arg(long)]
        camera_off: bool,

        #[arg(long, env = "SPHERE_TOKEN")]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { config, bind } => {
            let mut config = match config {
                Some(path) => {
                    info!("Loading relay config from {}", path.display());
                    ServerConfig::load(path)?
                }
                None => ServerConfig::default(),
            };
            if let Some(bind) = bind {
                config.bind = bind;
            }

            println!("{}", format!("Relay starting on {}", config.bind).green().bold());
            sphere_server::serve(config).await
        }

        Commands::Join {
            server,
            room,
            name,
            private,
            muted,
            camera_off,
            token,
        } => {
            let user = UserProfile::new(name);
            let mut config = EngineConfig::new(room, user);
            config.privacy = if private {
                RoomPrivacy::Private
            } else {
                RoomPrivacy::Public
            };
            config.auth_token = token;
            config.start_muted = muted;
            config.start_camera_off = camera_off;

            run_participant(&server, config).await
        }
    }
}

async fn run_participant(server: &str, config: EngineConfig) -> Result<()> {
    let (signaling, signal_rx) = WsSignaling::connect(server, &config.user.id)
        .await
        .with_context(|| format!("Failed to connect to {}", server))?;
    info!("Connected to signaling server {}", server);

    println!(
        "{}",
        format!("Joining '{}' as {}", config.room_id, config.user.name).cyan()
    );

    let (engine, handle, mut events) = CallEngine::new(
        config,
        Arc::new(RtcTransportFactory::new()),
        Arc::new(SyntheticMediaDevices::new()),
        Arc::new(signaling),
        signal_rx,
    );
    let engine_task = tokio::spawn(engine.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let exited = matches!(event, CallEvent::Exited(_));
                print_event(&event);
                if exited {
                    break;
                }
            }

            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if let Err(e) = run_command(&handle, line.trim()).await {
                            println!("{}", format!("! {}", e).red());
                        }
                    }
                    Ok(None) | Err(_) => {
                        debug!("stdin closed, leaving the room");
                        stdin_open = false;
                        let _ = handle.leave().await;
                    }
                }
            }
        }
    }

    engine_task.await.context("Engine task panicked")?;
    info!("Call engine stopped");
    Ok(())
}

async fn run_command(handle: &CallHandle, line: &str) -> Result<()> {
    if line.is_empty() {
        return Ok(());
    }
    if !line.starts_with('/') {
        handle.send_chat(line).await?;
        return Ok(());
    }

    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();
    match command {
        "/mute" => {
            let media = handle.toggle_mute().await?;
            println!("muted: {}", media.is_muted);
        }
        "/camera" => {
            let media = handle.toggle_camera().await?;
            println!("camera off: {}", media.is_camera_off);
        }
        "/share" => {
            let media = handle.toggle_screen_share().await?;
            println!("sharing: {}", media.is_screen_sharing);
        }
        "/lock" => handle.toggle_room_lock().await?,
        "/approve" | "/reject" => {
            let view = handle.snapshot().await?;
            let request = view
                .join_requests
                .iter()
                .find(|r| r.username == arg)
                .with_context(|| format!("No join request from '{}'", arg))?;
            handle
                .respond_join_request(request.user_id.clone(), command == "/approve")
                .await?;
        }
        "/kick" => {
            let target = find_participant(handle, arg).await?;
            handle.admin_remove(target.id).await?;
        }
        "/silence" => {
            let target = find_participant(handle, arg).await?;
            handle.admin_mute(target.id).await?;
        }
        "/notes" => handle.update_notes(arg).await?,
        "/read" => {
            let count = handle.set_chat_open(true).await?;
            handle.set_chat_open(false).await?;
            println!("{} messages marked read", count);
        }
        "/who" => {
            let view = handle.snapshot().await?;
            println!("{} (you){}", view.me.name.bold(), badges(&view.me));
            for p in &view.participants {
                println!("{}{}", p.name, badges(p));
            }
        }
        "/delete" => handle.delete_room().await?,
        "/leave" => handle.leave().await?,
        other => anyhow::bail!("Unknown command {}", other),
    }
    Ok(())
}

async fn find_participant(handle: &CallHandle, name: &str) -> Result<Participant> {
    let view = handle.snapshot().await?;
    view.participants
        .into_iter()
        .find(|p| p.name == name)
        .with_context(|| format!("No participant named '{}'", name))
}

fn badges(p: &Participant) -> String {
    let mut out = String::new();
    if p.is_creator {
        out.push_str(" [creator]");
    } else if p.is_admin {
        out.push_str(" [admin]");
    }
    if p.media.is_muted {
        out.push_str(" [muted]");
    }
    if p.media.is_camera_off {
        out.push_str(" [no video]");
    }
    if p.media.is_screen_sharing {
        out.push_str(" [sharing]");
    }
    out
}

fn print_event(event: &CallEvent) {
    match event {
        CallEvent::PhaseChanged(RoomPhase::Pending) => {
            println!("{}", "Waiting for an admin to let you in...".yellow());
        }
        CallEvent::PhaseChanged(RoomPhase::Joined) => {
            println!("{}", "Joined the room".green().bold());
        }
        CallEvent::PhaseChanged(_) => {}
        CallEvent::ParticipantJoined(p) => println!("{}", format!("+ {}", p.name).green()),
        CallEvent::ParticipantLeft(id) => println!("{}", format!("- {}", id).dimmed()),
        CallEvent::ParticipantUpdated(p) => println!("* {}{}", p.name, badges(p)),
        CallEvent::MediaChanged { .. } => {}
        CallEvent::JoinRequested(r) => println!(
            "{}",
            format!("{} wants to join (/approve {0} or /reject {0})", r.username).yellow()
        ),
        CallEvent::JoinRequestsChanged(_) => {}
        CallEvent::ChatReceived(m) => println!("{}: {}", m.username.bold(), m.message),
        CallEvent::NotesChanged { notes, .. } => println!("{}\n{}", "notes:".cyan(), notes),
        CallEvent::TimerChanged(t) => println!(
            "timer: {}s left{}",
            t.remaining_secs,
            if t.running { "" } else { " (paused)" }
        ),
        CallEvent::LockChanged(locked) => {
            println!("room {}", if *locked { "locked" } else { "unlocked" })
        }
        CallEvent::RemoteTrack { peer, track } => {
            println!("{}", format!("{:?} track from {}", track.kind, peer).dimmed())
        }
        CallEvent::ConnectionState { peer, state } => {
            println!("{}", format!("{}: {:?}", peer, state).dimmed())
        }
        CallEvent::ScreenShareFocused(_) => println!("{}", "Your screen is shared".cyan()),
        CallEvent::Notice(n) => match n.level {
            NoticeLevel::Info => println!("{}", n.message.cyan()),
            NoticeLevel::Warning => println!("{}", n.message.yellow()),
            NoticeLevel::Error => println!("{}", n.message.red()),
        },
        CallEvent::Exited(phase) => println!("{}", format!("Call ended: {:?}", phase).bold()),
    }
}
