use spargel::{lower, parse, TreeNode};

fn labels(node: &TreeNode) -> Vec<&str> {
    let mut out = vec![node.label.as_str()];
    for child in &node.children {
        out.extend(labels(child));
    }
    out
}

#[test]
fn abstract_dump() {
    let file = lower(&parse(include_str!("testfiles/forward.sp")).unwrap());
    let tree = file.dump_tree();

    assert_eq!(tree.label, "SourceFile [1 opens, 2 functions]");
    let labels = labels(&tree);
    assert!(labels.iter().any(|label| label.starts_with("OpenDecl") && label.ends_with("<module = std>")));
    assert!(labels.iter().any(|label| label.starts_with("FuncDecl") && label.ends_with("<name = a>")));
    assert!(labels.iter().any(|label| label.starts_with("Ident") && label.ends_with("<add>")));
    assert!(!labels.iter().any(|label| label.contains("Grouped")));
}

#[test]
fn concrete_dump_keeps_groupings() {
    let file = parse("func f() (a + b)").unwrap();
    let tree = file.dump_tree();

    assert_eq!(tree.label, "SourceFile [1 items]");
    assert!(labels(&tree).contains(&"GroupedExpr"));
    assert!(labels(&tree).contains(&"AddExpr"));
}

#[test]
fn dumps_render() {
    let file = parse("open std func f() 1").unwrap();
    let rendered = file.dump_tree().render().unwrap();
    assert!(rendered.starts_with("SourceFile [2 items]"));
    assert!(rendered.contains("FuncDecl <name = f>"));
    assert!(rendered.contains("LitExpr <value = 1>"));
}
