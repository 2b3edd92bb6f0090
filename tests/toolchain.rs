//! End-to-end tests across the whole pipeline: source text through the
//! assembler and linker into the simulator.

use kestrel_asm::kestrel::arch::{STATIC_BEGIN, STACK_BEGIN};
use kestrel_asm::kestrel::asm::assemble;
use kestrel_asm::kestrel::decoder::{decode, disasm};
use kestrel_asm::kestrel::instruction::Instruction;
use kestrel_asm::kestrel::linker::link;
use kestrel_asm::kestrel::sim::{NullOutput, Simulator};

fn build(sources: &[&str]) -> Simulator {
    let mut programs = Vec::new();
    for src in sources {
        let (p, errs) = assemble(src);
        assert!(errs.is_empty(), "assemble errors: {errs:?}");
        programs.push(p);
    }
    Simulator::new(link(&programs).expect("link"), Box::new(NullOutput))
}

fn run_to_completion(sim: &mut Simulator) -> usize {
    let mut steps = 0;
    while !sim.is_done() {
        sim.step().expect("step");
        steps += 1;
        assert!(steps < 100_000, "runaway program");
    }
    steps
}

#[test]
fn add_executes_with_preset_registers() {
    let mut sim = build(&["add x3, x1, x2"]);
    sim.set_reg_no_undo(1, 10);
    sim.set_reg_no_undo(2, 20);
    sim.step().unwrap();
    assert_eq!(sim.get_reg(3), 30);
    assert_eq!(sim.get_pc(), 4);
}

#[test]
fn data_bytes_land_at_static_begin() {
    let sim = build(&[".data\n.byte 1 2 3 4\n.text\nnop"]);
    for i in 0..4 {
        assert_eq!(sim.load_byte(STATIC_BEGIN + i).unwrap(), (i + 1) as u8);
    }
}

#[test]
fn asciiz_strings_pack_back_to_back() {
    let sim = build(&[".data\n.asciiz \"a\"\n.asciiz \"b\""]);
    assert_eq!(sim.load_byte(STATIC_BEGIN).unwrap(), b'a');
    assert_eq!(sim.load_byte(STATIC_BEGIN + 1).unwrap(), 0);
    assert_eq!(sim.load_byte(STATIC_BEGIN + 2).unwrap(), b'b');
    assert_eq!(sim.load_byte(STATIC_BEGIN + 3).unwrap(), 0);
}

#[test]
fn linked_units_append_their_data() {
    let sim = build(&[
        ".data\n.byte 11\n.text\nnop",
        ".data\n.byte 22\n.text\nnop",
    ]);
    assert_eq!(sim.load_byte(STATIC_BEGIN).unwrap(), 11);
    assert_eq!(sim.load_byte(STATIC_BEGIN + 1).unwrap(), 22);
}

#[test]
fn negative_word_survives_the_round_trip() {
    let sim = build(&[".data\n.word -21231234\n.text\nnop"]);
    assert_eq!(sim.load_word(STATIC_BEGIN).unwrap() as i32, -21231234);
}

#[test]
fn raw_word_dispatches_to_add() {
    let inst = decode(0b0000000_00001_00010_000_00011_0110011).unwrap();
    assert_eq!(inst, Instruction::Add { rd: 3, rs1: 2, rs2: 1 });
}

#[test]
fn load_word_is_the_little_endian_byte_composition() {
    let sim = build(&[".data\n.word 0x0A0B0C0D\n.text\nnop"]);
    let a = STATIC_BEGIN;
    let composed = sim.load_byte(a).unwrap() as u32
        | (sim.load_byte(a + 1).unwrap() as u32) << 8
        | (sim.load_byte(a + 2).unwrap() as u32) << 16
        | (sim.load_byte(a + 3).unwrap() as u32) << 24;
    assert_eq!(sim.load_word(a).unwrap(), composed);
    assert_eq!(composed, 0x0A0B0C0D);
}

#[test]
fn fibonacci_runs_to_completion() {
    let src = "\
main:
    li t0, 0
    li t1, 1
    li t2, 10
    li t3, 0
loop:
    bge t3, t2, done
    add t4, t0, t1
    mv t0, t1
    mv t1, t4
    addi t3, t3, 1
    j loop
done:
    li a7, 10
    ecall
";
    let mut sim = build(&[src]);
    run_to_completion(&mut sim);
    // fib: 0 1 1 2 3 5 8 13 21 34 55; after 10 iterations t0 = fib(10)
    assert_eq!(sim.get_reg(5), 55);
}

#[test]
fn every_step_undoes_to_the_bitwise_pre_state() {
    let src = "\
main:
    la t0, buf
    li t1, 0x11223344
    sw t1, 0(t0)
    sh t1, 4(t0)
    sb t1, 6(t0)
    addi sp, sp, -8
    sw t1, 0(sp)
    li a7, 17
    li a0, 2
    ecall
.data
buf: .space 8
";
    let mut sim = build(&[src]);

    let snapshot = |sim: &Simulator| {
        let regs: Vec<u32> = (0..32).map(|i| sim.get_reg(i)).collect();
        let mut mem = Vec::new();
        for i in 0..8 {
            mem.push(sim.load_byte(STATIC_BEGIN + i).unwrap());
        }
        for i in 0..8 {
            mem.push(sim.load_byte(STACK_BEGIN - 8 + i).unwrap());
        }
        (regs, sim.get_pc(), mem)
    };

    let before = snapshot(&sim);
    let steps = run_to_completion(&mut sim);
    assert!(sim.is_done());
    assert_ne!(snapshot(&sim), before, "program must have visible effects");

    for _ in 0..steps {
        assert!(sim.can_undo());
        sim.undo();
    }
    assert!(!sim.can_undo());
    assert_eq!(snapshot(&sim), before);
    assert!(!sim.is_done());
}

#[test]
fn x0_stays_zero_through_every_write_path() {
    let mut sim = build(&["addi x0, x0, 5\nsub x0, x0, x0\nlui x0, 4"]);
    for _ in 0..3 {
        sim.step().unwrap();
        assert_eq!(sim.get_reg(0), 0);
    }
}

#[test]
fn disassembled_text_reassembles_to_identical_bytes() {
    let src = "\
main:
    la t0, value
    lw t1, 0(t0)
loop:
    addi t1, t1, -1
    bne t1, x0, loop
    sw t1, 0(t0)
    jal x0, main
.data
value: .word 3
";
    let (p, errs) = assemble(src);
    assert!(errs.is_empty());
    let linked = link(&[p]).unwrap();

    let listing: Vec<String> = linked.text.iter().map(|w| disasm(*w)).collect();
    let (again, errs) = assemble(&listing.join("\n"));
    assert!(errs.is_empty(), "listing must reassemble: {errs:?}");
    let relinked = link(&[again]).unwrap();
    assert_eq!(relinked.text, linked.text);
}

#[test]
fn branch_targets_match_pc_plus_immediate() {
    let src = "\
main:
    j fwd
    nop
    nop
fwd:
    beq x0, x0, back
back:
    nop
";
    let mut sim = build(&[src]);
    let pc = sim.get_pc();
    let word = sim.load_word(pc).unwrap();
    let Instruction::Jal { imm, .. } = decode(word).unwrap() else {
        panic!("expected jal");
    };
    sim.step().unwrap();
    assert_eq!(sim.get_pc(), pc.wrapping_add(imm as u32));

    let pc = sim.get_pc();
    let word = sim.load_word(pc).unwrap();
    let Instruction::Beq { imm, .. } = decode(word).unwrap() else {
        panic!("expected beq");
    };
    sim.step().unwrap();
    assert_eq!(sim.get_pc(), pc.wrapping_add(imm as u32));
}

#[test]
fn exit_code_propagates_from_the_program() {
    let mut sim = build(&["li a0, 7\nli a7, 17\necall"]);
    run_to_completion(&mut sim);
    assert_eq!(sim.exit_code(), 7);
}

#[test]
fn cross_unit_call_and_shared_data() {
    let a = "\
.globl main
main:
    call fill
    la t0, shared
    lb t1, 0(t0)
    li a7, 10
    ecall
.data
local: .byte 0
";
    let b = "\
.globl fill
.globl shared
fill:
    la t2, shared
    li t3, 99
    sb t3, 0(t2)
    ret
.data
shared: .byte 1
";
    let mut sim = build(&[a, b]);
    run_to_completion(&mut sim);
    assert_eq!(sim.get_reg(6), 99);
}

#[test]
fn print_output_reaches_the_transcript() {
    let src = "\
.data
msg: .asciiz \"count: \"
.text
main:
    la a0, msg
    li a7, 4
    ecall
    li a0, 3
    li a7, 1
    ecall
    li a0, '\\n'
    li a7, 11
    ecall
    li a7, 10
    ecall
";
    let mut sim = build(&[src]);
    run_to_completion(&mut sim);
    assert_eq!(sim.stdout(), "count: 3\n");
}
