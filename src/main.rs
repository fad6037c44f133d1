use vezir::board::Board;
use vezir::perft;
use vezir::uci;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("uci") => uci::run(),
        Some("perft") => run_perft(&args[1..]),
        Some(other) => {
            eprintln!("unknown mode `{other}`; expected `uci` or `perft <depth> [fen]`");
            std::process::exit(2);
        }
    }
}

fn run_perft(args: &[String]) {
    let Some(depth) = args.first().and_then(|d| d.parse::<u32>().ok()) else {
        eprintln!("usage: vezir perft <depth> [fen]");
        std::process::exit(2);
    };

    let mut board = Board::new();
    if args.len() > 1 {
        let fen = args[1..].join(" ");
        if let Err(err) = board.from_fen(&fen) {
            eprintln!("rejected FEN: {err}");
            std::process::exit(2);
        }
    } else {
        board.set_startpos();
    }

    print!("{board}");
    perft::divide(&mut board, depth);
}
