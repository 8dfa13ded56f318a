//! End-to-end: a client talking to the serve loop over an in-memory duplex
//! with the simulated stage bound.

use coxiris_link::{bind_stage, build_processor, serve, LinkConfig, SimulatedStage};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

struct Client {
    lines: Lines<BufReader<tokio::io::ReadHalf<DuplexStream>>>,
    writer: tokio::io::WriteHalf<DuplexStream>,
}

impl Client {
    async fn send(&mut self, command: &str) {
        self.writer
            .write_all(format!("{command}\r\n").as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> String {
        self.lines.next_line().await.unwrap().unwrap()
    }

    /// Send a command and collect lines up to and including its DONE.
    async fn exchange(&mut self, command: &str) -> Vec<String> {
        self.send(command).await;
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await;
            let done = line.starts_with("DONE ");
            lines.push(line);
            if done {
                return lines;
            }
        }
    }
}

fn start(
    config: LinkConfig,
) -> (
    Client,
    Arc<SimulatedStage>,
    tokio::task::JoinHandle<coxiris_link::LinkResult<coxiris_link::ServiceStats>>,
) {
    let (client_side, link_side) = tokio::io::duplex(1024);
    let stage = Arc::new(SimulatedStage::from_config(&config.simulator));
    let mut processor = build_processor(&config, bind_stage(stage.clone()));

    let server = tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(link_side);
        serve(reader, writer, &mut processor).await
    });

    let (reader, writer) = tokio::io::split(client_side);
    let client = Client {
        lines: BufReader::new(reader).lines(),
        writer,
    };
    (client, stage, server)
}

#[tokio::test]
async fn move_and_query_position() {
    let (mut client, _stage, _server) = start(LinkConfig::default());

    assert_eq!(
        client.exchange("absolute_move 10 -2.5 3.333").await,
        vec!["ACK ABSOLUTE_MOVE", "DONE ABSOLUTE_MOVE"]
    );
    assert_eq!(
        client.exchange("DELTA_MOVE 1 1 1").await,
        vec!["ACK DELTA_MOVE", "DONE DELTA_MOVE"]
    );
    assert_eq!(
        client.exchange("GET_POSITION").await,
        vec!["ACK GET_POSITION", "DONE GET_POSITION: 11.00 -1.50 4.33"]
    );
}

#[tokio::test]
async fn set_home_then_go_home() {
    let (mut client, stage, _server) = start(LinkConfig::default());

    client.exchange("ABSOLUTE_MOVE 5 5 5").await;
    client.exchange("SET_HOME").await;
    client.exchange("DELTA_MOVE 2 0 0").await;
    client.exchange("GO_HOME").await;

    assert_eq!(
        client.exchange("GET_POSITION").await,
        vec!["ACK GET_POSITION", "DONE GET_POSITION: 0.00 0.00 0.00"]
    );
    assert_eq!(
        stage.machine_position(),
        coxiris_core::Position::new(5.0, 5.0, 5.0)
    );
}

#[tokio::test]
async fn speed_limits_come_from_the_stage() {
    let (mut client, _stage, _server) = start(LinkConfig::default());

    assert_eq!(
        client.exchange("GET_MAX_SPEED").await,
        vec!["ACK GET_MAX_SPEED", "DONE GET_MAX_SPEED: 50"]
    );
    assert_eq!(
        client.exchange("SET_SPEED 20").await,
        vec!["ACK SET_SPEED", "DONE SET_SPEED"]
    );
    assert_eq!(
        client.exchange("GET_SPEED").await,
        vec!["ACK GET_SPEED", "DONE GET_SPEED: 20"]
    );
}

#[tokio::test]
async fn stage_faults_surface_through_check_errors() {
    let (mut client, _stage, _server) = start(LinkConfig::default());

    assert_eq!(
        client.exchange("SET_SPEED 500").await,
        vec![
            "ACK SET_SPEED",
            "ERROR: SET_SPEED failed - speed 500 outside 0.5..50 mm/s",
            "DONE SET_SPEED",
        ]
    );
    assert_eq!(
        client.exchange("CHECK_ERRORS").await,
        vec![
            "ACK CHECK_ERRORS",
            "ERROR: CHECK_ERRORS failed - speed 500 outside 0.5..50 mm/s",
            "DONE CHECK_ERRORS",
        ]
    );
    assert_eq!(
        client.exchange("CHECK_ERRORS").await,
        vec!["ACK CHECK_ERRORS", "DONE CHECK_ERRORS"]
    );
}

#[tokio::test]
async fn out_of_travel_move_keeps_position() {
    let (mut client, _stage, _server) = start(LinkConfig::default());

    let lines = client.exchange("ABSOLUTE_MOVE 0 150 0").await;
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "ERROR: ABSOLUTE_MOVE failed - y out of travel (150.00 mm, limit 100.00)"
    );
    assert_eq!(
        client.exchange("GET_POSITION").await,
        vec!["ACK GET_POSITION", "DONE GET_POSITION: 0.00 0.00 0.00"]
    );
}

#[tokio::test]
async fn configured_identity_and_stats_on_close() {
    let mut config = LinkConfig::default();
    config.protocol.device_id = "RIG-7".to_string();
    let (mut client, _stage, server) = start(config);

    assert_eq!(
        client.exchange("get_id").await,
        vec!["ACK GET_ID", "DONE GET_ID: RIG-7"]
    );
    client.send("NOT_A_COMMAND").await;
    assert_eq!(client.recv().await, "ERROR: Unknown command - NOT_A_COMMAND");

    drop(client);
    let stats = server.await.unwrap().unwrap();
    assert_eq!(stats.lines, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.bytes_read, ("get_id\r\n".len() + "NOT_A_COMMAND\r\n".len()) as u64);
}

#[tokio::test]
async fn half_speeds_round_up_like_the_firmware() {
    let (mut client, _stage, _server) = start(LinkConfig::default());

    assert_eq!(
        client.exchange("GET_MIN_SPEED").await,
        vec!["ACK GET_MIN_SPEED", "DONE GET_MIN_SPEED: 1"]
    );
    client.exchange("SET_SPEED 2.5").await;
    assert_eq!(
        client.exchange("GET_SPEED").await,
        vec!["ACK GET_SPEED", "DONE GET_SPEED: 3"]
    );
}
