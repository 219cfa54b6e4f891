use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rand::Rng;
use tstate_cpu_validation::{
    TimingCase, TracingPinBus, TransactionKind, Z80CpuState, powered_cpu, run_instruction,
    transactions, write_cases,
};

const NUM_TESTS: usize = 500;

/// Opcode tables a vector file can cover, with the bytes placed before
/// the opcode. Indexed CB forms put the displacement between prefix and
/// opcode, so their leading bytes are written separately.
const PREFIXES: [(&str, &[u8]); 7] = [
    ("none", &[]),
    ("cb", &[0xCB]),
    ("dd", &[0xDD]),
    ("ed", &[0xED]),
    ("fd", &[0xFD]),
    ("ddcb", &[0xDD, 0xCB]),
    ("fdcb", &[0xFD, 0xCB]),
];

fn instruction_bytes(rng: &mut impl Rng, lead: &[u8], opcode: u8) -> Vec<u8> {
    let mut bytes = lead.to_vec();
    if lead.len() == 2 {
        bytes.push(rng.r#gen());
    }
    bytes.push(opcode);
    bytes
}

fn build_ram(memory: &[u8; 0x10000], addresses: &BTreeSet<u16>) -> Vec<(u16, u8)> {
    addresses
        .iter()
        .map(|&addr| (addr, memory[addr as usize]))
        .collect()
}

fn random_state(rng: &mut impl Rng, max_pc: u16) -> Z80CpuState {
    Z80CpuState {
        pc: rng.gen_range(0..=max_pc),
        sp: rng.r#gen(),
        af: rng.r#gen(),
        bc: rng.r#gen(),
        de: rng.r#gen(),
        hl: rng.r#gen(),
        ix: rng.r#gen(),
        iy: rng.r#gen(),
        af_prime: rng.r#gen(),
        bc_prime: rng.r#gen(),
        de_prime: rng.r#gen(),
        hl_prime: rng.r#gen(),
        wz: rng.r#gen(),
        i: rng.r#gen(),
        r: rng.r#gen(),
        ram: Vec::new(),
    }
}

fn generate_opcode(rng: &mut impl Rng, lead: &[u8], opcode: u8) -> Vec<TimingCase> {
    let mut tests = Vec::with_capacity(NUM_TESTS);

    for _ in 0..NUM_TESTS {
        let mut bus = TracingPinBus::new();
        let mut cpu = powered_cpu(&mut bus);

        rng.fill(&mut bus.memory[..]);
        rng.fill(&mut bus.ports[..]);

        let bytes = instruction_bytes(rng, lead, opcode);
        let mut initial = random_state(rng, (0x10000 - bytes.len()) as u16);
        initial.apply(&mut cpu);
        bus.load(initial.pc, &bytes);

        let pre_memory = bus.memory;
        let Some(edges) = run_instruction(&mut cpu, &mut bus, 1000) else {
            eprintln!("{bytes:02x?} did not complete; skipped");
            continue;
        };

        let traced = transactions(&bus.events);
        let addresses: BTreeSet<u16> = traced
            .iter()
            .filter(|t| {
                matches!(
                    t.kind,
                    TransactionKind::Fetch | TransactionKind::MemRead | TransactionKind::MemWrite
                )
            })
            .map(|t| t.addr)
            .collect();

        let mut final_state = Z80CpuState::capture(&cpu);
        initial.ram = build_ram(&pre_memory, &addresses);
        final_state.ram = build_ram(&bus.memory, &addresses);

        let name = bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ");

        tests.push(TimingCase {
            name,
            initial,
            final_state,
            edges,
            transactions: traced,
        });
    }

    tests
}

fn generate_and_write(rng: &mut impl Rng, prefix: &str, lead: &[u8], opcode: u8, out_dir: &Path) {
    let tests = generate_opcode(rng, lead, opcode);
    let out_path = out_dir.join(format!("{prefix}_{opcode:02x}.json.gz"));
    if let Err(e) = write_cases(&out_path, &tests) {
        eprintln!("Failed to write {}: {e}", out_path.display());
        std::process::exit(1);
    }
    println!(
        "Generated {} tests for {prefix} 0x{opcode:02X} -> {}",
        tests.len(),
        out_path.display()
    );
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: gen_z80_timing <opcode_hex | all> [none|cb|dd|ed|fd|ddcb|fdcb]");
        eprintln!("Examples:");
        eprintln!("  gen_z80_timing 0x3E");
        eprintln!("  gen_z80_timing all ed");
        std::process::exit(1);
    }

    let prefix = args.get(2).map(String::as_str).unwrap_or("none");
    let Some(&(prefix, lead)) = PREFIXES.iter().find(|(name, _)| *name == prefix) else {
        eprintln!("Unknown prefix: {prefix}");
        std::process::exit(1);
    };

    let out_dir = Path::new("test_data/z80_timing");
    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create {}: {e}", out_dir.display());
        std::process::exit(1);
    }

    let mut rng = rand::thread_rng();

    if args[1] == "all" {
        for opcode in 0x00..=0xFFu8 {
            generate_and_write(&mut rng, prefix, lead, opcode, out_dir);
        }
        println!("Generated tests for 256 opcodes");
    } else {
        let opcode_str = args[1].trim_start_matches("0x").trim_start_matches("0X");
        let opcode = u8::from_str_radix(opcode_str, 16).unwrap_or_else(|_| {
            eprintln!("Invalid hex opcode: {}", args[1]);
            std::process::exit(1);
        });
        generate_and_write(&mut rng, prefix, lead, opcode, out_dir);
    }
}
