use lalrgen::actions::Action;
use lalrgen::pipeline;

fn build(source: &str) -> (lalrgen::pipeline::GeneratedParser, Vec<lalrgen::error::Error>) {
    pipeline::build(source, "test.y", false).expect("pipeline build failed")
}

/// spec scenario 1: `S : 'a' ;` — 4 states, shift on 'a', reduce, accept,
/// zero conflicts.
#[test]
fn trivial_grammar() {
    let (generated, warnings) = build("%%\nS : 'a' ;\n");
    assert!(warnings.is_empty());
    assert_eq!(generated.automaton.states.len(), 4);
    assert_eq!(generated.action_table.shift_reduce_conflicts, 0);
    assert_eq!(generated.action_table.reduce_reduce_conflicts, 0);

    let state0 = &generated.action_table.states[0];
    let shift_on_a = state0
        .action_for_token
        .iter()
        .find(|(token, _)| token.name() == "a");
    assert!(matches!(shift_on_a, Some((_, Action::Shift(_)))));
}

/// spec scenario 2: classical expression grammar with `%left '+'`/`%left '*'`
/// (higher precedence) — every shift/reduce conflict the bare grammar would
/// have is resolved by precedence.
#[test]
fn expression_with_precedence() {
    let source = "\
%token NUM
%left '+'
%left '*'
%%
E : E '+' E
  | E '*' E
  | '(' E ')'
  | NUM
  ;
";
    let (generated, warnings) = build(source);
    assert!(warnings.is_empty());
    assert_eq!(generated.action_table.shift_reduce_conflicts, 0);

    // find the state reached after "E + E" (dot at end of the '+' alternative,
    // with a further '*' on lookahead): it must shift, since '*' binds
    // tighter than '+'.
    let mut found_precedence_controlled_state = false;
    for state in &generated.action_table.states {
        let has_plus_reduce_candidate = generated.productions.iter().any(|p| {
            p.left_hand_side().name() == "E" && p.len() == 3 && p.precedence() > 0
        });
        assert!(has_plus_reduce_candidate);
        if let Some(Action::Shift(_)) = state.action_for_token.iter().find_map(|(t, a)| {
            if t.name() == "*" {
                Some(a)
            } else {
                None
            }
        }) {
            found_precedence_controlled_state = true;
        }
    }
    assert!(found_precedence_controlled_state);
}

/// spec scenario 3: dangling else — exactly one shift/reduce conflict,
/// resolved to shift (ELSE binds to the innermost IF).
#[test]
fn dangling_else() {
    let source = "\
%token IF
%token ELSE
%token OTHER
%token COND
%%
S : IF COND S
  | IF COND S ELSE S
  | OTHER
  ;
";
    let (generated, _warnings) = build(source);
    assert_eq!(generated.action_table.shift_reduce_conflicts, 1);

    let conflict_state = generated
        .action_table
        .states
        .iter()
        .find(|s| s.conflicts.iter().any(|c| c.token.name() == "ELSE"))
        .expect("expected a conflict on ELSE");
    let resolved = conflict_state.action_for_token.get(
        conflict_state
            .conflicts
            .iter()
            .find(|c| c.token.name() == "ELSE")
            .map(|c| &c.token)
            .unwrap(),
    );
    assert!(matches!(resolved, Some(Action::Shift(_))));
}

/// spec scenario 4: reduce/reduce conflict resolved to the earlier-declared
/// rule.
#[test]
fn reduce_reduce_conflict() {
    let source = "\
%token X
%%
S : A | B ;
A : X ;
B : X ;
";
    let (generated, _warnings) = build(source);
    assert_eq!(generated.action_table.reduce_reduce_conflicts, 1);

    let a_ident = generated
        .productions
        .iter()
        .find(|p| p.left_hand_side().name() == "A")
        .unwrap()
        .ident();
    let b_ident = generated
        .productions
        .iter()
        .find(|p| p.left_hand_side().name() == "B")
        .unwrap()
        .ident();
    assert!(a_ident < b_ident);

    let conflict_state = generated
        .action_table
        .states
        .iter()
        .find(|s| !s.conflicts.is_empty())
        .expect("expected a reduce/reduce conflict state");
    let end_token = conflict_state
        .conflicts
        .iter()
        .find(|c| c.token.name() == "$end")
        .expect("conflict recorded on $end")
        .token
        .clone();

    // The winning reduce (A, the lowest-numbered rule) is the only
    // reduction left in this state, so the default-reduction pass folds it
    // out of `action_for_token` and into `default_reduction`.
    let winning_ident = match conflict_state.action_for_token.get(&end_token) {
        Some(Action::Reduce(p)) => p.ident(),
        None => conflict_state
            .default_reduction
            .as_ref()
            .expect("reduce/reduce winner folded into the state default")
            .ident(),
        other => panic!("expected a reduce action or default reduction, got {:?}", other),
    };
    assert_eq!(winning_ident, a_ident);
}

/// spec scenario 5: nullable cascade — A and B derive the empty string, S
/// does not, and state 0's only reduction (`A -> epsilon`, lookahead `C`)
/// is its sole action and so becomes the state's default reduction.
#[test]
fn nullable_cascade() {
    let source = "\
%token C
%%
S : A B C ;
A : ;
B : ;
";
    let (generated, _warnings) = build(source);

    let a = generated
        .symbols
        .non_terminals
        .iter()
        .find(|nt| nt.name() == "A")
        .unwrap();
    let b = generated
        .symbols
        .non_terminals
        .iter()
        .find(|nt| nt.name() == "B")
        .unwrap();
    let s = generated
        .symbols
        .non_terminals
        .iter()
        .find(|nt| nt.name() == "S")
        .unwrap();

    assert!(generated.nullable_derives.is_nullable(a));
    assert!(generated.nullable_derives.is_nullable(b));
    assert!(!generated.nullable_derives.is_nullable(s));

    let state0 = &generated.action_table.states[0];
    let default = state0
        .default_reduction
        .as_ref()
        .expect("state 0's sole reduction (A -> epsilon) becomes its default");
    assert_eq!(default.left_hand_side().name(), "A");
}

/// spec scenario 6: a state that reduces the same rule on every lookahead
/// except one shift collapses to a single explicit entry once the default
/// reduction absorbs the rest.
#[test]
fn default_reduction_collapses_row() {
    let source = "\
%token A
%%
S : A S
  | A
  ;
";
    let (generated, _warnings) = build(source);

    let collapsed = generated
        .action_table
        .states
        .iter()
        .find(|s| s.default_reduction.is_some() && s.action_for_token.len() == 1)
        .expect("expected a state whose row collapsed to one explicit entry");
    assert!(matches!(
        collapsed.action_for_token.values().next(),
        Some(Action::Shift(_))
    ));
}

#[test]
fn packed_tables_respect_check_invariant() {
    let source = "\
%token NUM
%left '+'
%left '*'
%%
E : E '+' E
  | E '*' E
  | '(' E ')'
  | NUM
  ;
";
    let (generated, _warnings) = build(source);
    let packed = &generated.packed;
    assert_eq!(packed.base.len(), generated.automaton.states.len());
    assert_eq!(packed.default.len(), generated.automaton.states.len());
    for (state_id, &base) in packed.base.iter().enumerate() {
        if base < 0 {
            continue;
        }
        for token_idx in 0..generated.symbols.ntokens {
            let slot = base as usize + token_idx;
            if slot < packed.check.len() && packed.check[slot] == state_id as i32 {
                assert!(packed.action[slot].is_some());
            }
        }
    }
}
