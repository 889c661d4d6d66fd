use rstest::*;
use tokio::net::{TcpListener, TcpStream};
use yao_common::{duplex, framed, Channel, Role};
use yao_core::{
    circuits::{self, from_bits, to_bits},
    Circuit, GateOp,
};
use yao_ot::OtMode;
use yao_session::{ErrorKind, Evaluator, Garbler, SessionConfig, SessionError, SessionOutput};

fn config(ot_mode: OtMode) -> SessionConfig {
    SessionConfig::builder().ot_mode(ot_mode).build().unwrap()
}

async fn run_pair(
    garbler_mode: OtMode,
    evaluator_mode: OtMode,
    circ: Circuit,
    garbler_bits: Vec<bool>,
    evaluator_bits: Vec<bool>,
) -> (
    Result<SessionOutput, SessionError>,
    Result<SessionOutput, SessionError>,
) {
    let (mut gen_channel, mut ev_channel) = duplex(1 << 16);

    let garbler = Garbler::new(config(garbler_mode));
    let evaluator = Evaluator::new(config(evaluator_mode));

    // Each side owns its end of the channel, so an aborting party
    // disconnects the other.
    let gen_fut = async move { garbler.run(&mut gen_channel, &circ, &garbler_bits).await };
    let ev_fut = async move { evaluator.run(&mut ev_channel, &evaluator_bits).await };

    tokio::join!(gen_fut, ev_fut)
}

#[rstest]
#[case::first_smaller(5, 3, 3)]
#[case::second_smaller(200, 10, 10)]
#[case::equal(7, 7, 7)]
#[tokio::test]
async fn test_min(
    #[case] a: u64,
    #[case] b: u64,
    #[case] expected: u64,
    #[values(OtMode::Secure, OtMode::Insecure)] mode: OtMode,
) {
    let (gen, ev) = run_pair(
        mode,
        mode,
        circuits::min(8).unwrap(),
        to_bits(a, 8),
        to_bits(b, 8),
    )
    .await;

    let gen = gen.unwrap();
    let ev = ev.unwrap();

    assert_eq!(from_bits(&gen.outputs), expected);
    assert_eq!(gen.outputs, ev.outputs);
    assert_eq!(gen.masked_outputs, ev.masked_outputs);
    assert_eq!(gen.role, Role::Garbler);
    assert_eq!(ev.role, Role::Evaluator);
    assert_eq!(ev.ot_wires.len(), 8);
    assert_eq!(ev.received.len(), 8);
    assert!(gen.received.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_every_gate(
    #[values(
        GateOp::And,
        GateOp::Or,
        GateOp::Xor,
        GateOp::Nand,
        GateOp::Nor,
        GateOp::Xnor
    )]
    op: GateOp,
) {
    for a in [false, true] {
        for b in [false, true] {
            let (gen, ev) = run_pair(
                OtMode::Secure,
                OtMode::Secure,
                circuits::single_gate(op).unwrap(),
                vec![a],
                vec![b],
            )
            .await;

            assert_eq!(gen.unwrap().outputs, vec![op.eval(a, b)]);
            assert_eq!(ev.unwrap().outputs, vec![op.eval(a, b)]);
        }
    }
}

#[tokio::test]
async fn test_not_without_evaluator_inputs() {
    let (gen, ev) = run_pair(
        OtMode::Secure,
        OtMode::Secure,
        circuits::single_gate(GateOp::Not).unwrap(),
        vec![true],
        vec![],
    )
    .await;

    assert_eq!(gen.unwrap().outputs, vec![false]);
    assert!(ev.unwrap().ot_wires.is_empty());
}

#[tokio::test]
async fn test_insecure_matches_secure() {
    let circ = circuits::min(6).unwrap();
    for (a, b) in [(0, 63), (17, 42), (42, 17), (33, 33)] {
        let (secure, _) = run_pair(
            OtMode::Secure,
            OtMode::Secure,
            circ.clone(),
            to_bits(a, 6),
            to_bits(b, 6),
        )
        .await;
        let (insecure, _) = run_pair(
            OtMode::Insecure,
            OtMode::Insecure,
            circ.clone(),
            to_bits(a, 6),
            to_bits(b, 6),
        )
        .await;

        assert_eq!(secure.unwrap().outputs, insecure.unwrap().outputs);
    }
}

#[tokio::test]
async fn test_ot_mode_mismatch() {
    let (gen, ev) = run_pair(
        OtMode::Insecure,
        OtMode::Secure,
        circuits::min(8).unwrap(),
        to_bits(1, 8),
        to_bits(2, 8),
    )
    .await;

    assert_eq!(ev.unwrap_err().kind(), ErrorKind::OtModeMismatch);
    assert_eq!(gen.unwrap_err().kind(), ErrorKind::Io);
}

#[tokio::test]
async fn test_garbler_input_length() {
    let (gen, ev) = run_pair(
        OtMode::Secure,
        OtMode::Secure,
        circuits::min(8).unwrap(),
        to_bits(1, 4),
        to_bits(2, 8),
    )
    .await;

    assert_eq!(gen.unwrap_err().kind(), ErrorKind::InputLength);
    assert_eq!(ev.unwrap_err().kind(), ErrorKind::Io);
}

#[tokio::test]
async fn test_evaluator_input_length() {
    let (gen, ev) = run_pair(
        OtMode::Secure,
        OtMode::Secure,
        circuits::min(8).unwrap(),
        to_bits(1, 8),
        to_bits(2, 9),
    )
    .await;

    assert_eq!(ev.unwrap_err().kind(), ErrorKind::InputLength);
    assert_eq!(gen.unwrap_err().kind(), ErrorKind::Ot);
}

#[tokio::test]
async fn test_malformed_setup() {
    let (mut gen_channel, mut ev_channel) = duplex(1 << 16);
    let evaluator = Evaluator::new(config(OtMode::Secure));

    gen_channel.send(vec![0xffu8; 7]).await.unwrap();

    let err = evaluator
        .run(&mut ev_channel, &to_bits(2, 8))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_garbler_disconnect() {
    let (gen_channel, mut ev_channel) = duplex(1 << 16);
    drop(gen_channel);

    let err = Evaluator::new(config(OtMode::Secure))
        .run(&mut ev_channel, &to_bits(2, 8))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[tokio::test]
async fn test_fresh_garbling_per_session() {
    let circ = circuits::min(8).unwrap();
    let (first, _) = run_pair(
        OtMode::Secure,
        OtMode::Secure,
        circ.clone(),
        to_bits(9, 8),
        to_bits(4, 8),
    )
    .await;
    let (second, _) = run_pair(
        OtMode::Secure,
        OtMode::Secure,
        circ,
        to_bits(9, 8),
        to_bits(4, 8),
    )
    .await;

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.outputs, second.outputs);
    assert_ne!(first.masked_outputs, second.masked_outputs);
}

#[tokio::test]
async fn test_serve_multiple_sessions() {
    let (mut gen_channel, mut ev_channel) = duplex(1 << 16);

    let circs = vec![
        circuits::min(8).unwrap(),
        circuits::single_gate(GateOp::Xor).unwrap(),
        circuits::min(4).unwrap(),
    ];

    let garbler = Garbler::new(SessionConfig::default());
    let evaluator = Evaluator::new(SessionConfig::default());

    let gen_circs = circs.clone();
    let gen_fut = async move {
        let mut outputs = Vec::new();
        for circ in &gen_circs {
            let bits = to_bits(12, circ.garbler_inputs().len());
            outputs.push(garbler.run(&mut gen_channel, circ, &bits).await.unwrap());
        }
        garbler.close(&mut gen_channel).await.unwrap();
        outputs
    };

    let ev_fut = async move {
        evaluator
            .serve(&mut ev_channel, |circ| {
                to_bits(10, circ.evaluator_inputs().len())
            })
            .await
            .unwrap()
    };

    let (gen, ev) = tokio::join!(gen_fut, ev_fut);

    assert_eq!(gen.len(), 3);
    assert_eq!(ev.len(), 3);
    for ((gen, ev), circ) in gen.iter().zip(&ev).zip(&circs) {
        assert_eq!(gen.circuit, circ.name());
        assert_eq!(gen.outputs, ev.outputs);
    }

    assert_eq!(from_bits(&gen[0].outputs), 10);
    // 12 = 0b1100 on one bit is 0, 10 = 0b1010 on one bit is 0.
    assert_eq!(gen[1].outputs, vec![false]);
    assert_eq!(from_bits(&gen[2].outputs), 10);
}

#[tokio::test]
async fn test_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let ev_fut = async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut channel = framed(socket);
        Evaluator::new(SessionConfig::default())
            .serve(&mut channel, |_| to_bits(200, 8))
            .await
            .unwrap()
    };

    let gen_fut = async move {
        let socket = TcpStream::connect(addr).await.unwrap();
        let mut channel = framed(socket);
        let garbler = Garbler::new(SessionConfig::default());
        let output = garbler
            .run(&mut channel, &circuits::min(8).unwrap(), &to_bits(10, 8))
            .await
            .unwrap();
        garbler.close(&mut channel).await.unwrap();
        output
    };

    let (ev, gen) = tokio::join!(ev_fut, gen_fut);

    assert_eq!(from_bits(&gen.outputs), 10);
    assert_eq!(ev[0].outputs, gen.outputs);
}
