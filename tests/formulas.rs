use textree::{parse, parse_with_settings, ParseNode, Settings, StrictMode};

const PASS: &[&str] = &[
    r"",
    r"h",
    r"1+1=2",
    r"e = \lim_{n \to \infty} \left(1 + \frac{1}{n}\right)^n",
    r"\int_a^b f(x)\,dx = F(b) - F(a)",
    r"\sum_{k=1}^n k = \frac{n(n+1)}{2}",
    r"\sqrt[3]{x^2 + y^2}",
    r"\textcolor{#ff0000}{x^2} + \color{blue} y",
    r"x \in \{a, b\}",
    r"\text{area} = \pi r^2",
    r"\left\langle \psi \middle| \phi \right\rangle",
    r"\genfrac[]{0pt}{2}{a+b}{c}",
    r"{p \choose q}",
    r"{1 \above{1.2pt} 2}",
    r"\operatorname{sinc}(x)",
    r"\operatornamewithlimits{argmax}\limits_{x} f(x)",
    r"\href{https://example.org/?q=1}{link}",
    r"\url{https://example.org/a_b\%20c}",
    r"\kern-3mu x \hskip 1em y",
    r"\rule[-0.2ex]{1em}{0.4pt}",
    r"a'' + b'^2",
    r"\verb*|code x|",
    r"\begingroup \alpha \endgroup",
    r"\text{\textbf{bold} and --- dashes}",
    r"\mathring{A} + \widehat{xyz}",
    r"\displaystyle \prod_{i} x_i",
    r"\raisebox{0.5em}{up}",
    r"\includegraphics[height=1em]{logo.png}",
    r"é + è",
    r"\left.\frac{df}{dx}\right|_{x=0}",
    r"\sqrt{\sqrt{x}}",
    r"\frac{\partial^2 u}{\partial t^2} = c^2 \nabla^2 u",
];

const FAIL: &[&str] = &[
    r"\frac",
    r"x^",
    r"x^2^3",
    r"{a",
    r"a}",
    r"\left(\right",
    r"\middle|",
    r"x \over y \over z",
    r"\color{nope!}x",
    r"\verb|abc",
    r"\kern2qq",
    r"\unknowncommand",
    r"\text{\sqrt2}",
    r"\genfrac{(}{)}{x}{0}{a}{b}",
    r"a\limits_2",
];

#[test]
fn pass_fail() {
    let mut fail = 0;

    for test in PASS {
        match parse(test) {
            Ok(_) => continue,
            Err(err) => {
                println!("Tex: {}", test);
                println!("Should have passed, failed with: {}", err);
                fail += 1;
            }
        }
    }

    for test in FAIL {
        match parse(test) {
            Err(_) => continue,
            Ok(nodes) => {
                println!("Tex: {}", test);
                println!("Should have failed, parsed as: {:?}", nodes);
                fail += 1;
            }
        }
    }

    if fail > 0 {
        panic!("{} Pass/Fail tests failed.", fail);
    }
}

#[test]
fn serialized_trees_carry_type_tags() {
    let nodes = parse("x^2").expect("parse");
    let json = serde_json::to_value(&nodes).expect("serialize");
    assert_eq!(json[0]["type"], "supsub");
    assert_eq!(json[0]["base"]["type"], "mathord");
    assert_eq!(json[0]["base"]["text"], "x");
    assert_eq!(json[0]["sup"]["type"], "textord");
    assert_eq!(json[0]["sub"], serde_json::Value::Null);

    let nodes = parse(r"\color{#fff} x").expect("parse");
    let json = serde_json::to_value(&nodes).expect("serialize");
    assert_eq!(json[0]["type"], "color");
    assert_eq!(json[0]["color"], "#fff");
}

#[test]
fn infix_rewrite_matches_prefix_form() {
    let infix = serde_json::to_value(parse(r"{1 \over 2}").expect("parse")).expect("serialize");
    let prefix = serde_json::to_value(parse(r"{\frac{1}{2}}").expect("parse")).expect("serialize");
    assert_eq!(infix, prefix);

    let choose = serde_json::to_value(parse(r"{n \choose k}").expect("parse")).expect("serialize");
    let binom =
        serde_json::to_value(parse(r"{\binom{n}{k}}").expect("parse")).expect("serialize");
    assert_eq!(choose, binom);
}

#[test]
fn no_infix_nodes_survive_in_returned_trees() {
    fn assert_no_infix(json: &serde_json::Value) {
        match json {
            serde_json::Value::Array(items) => items.iter().for_each(assert_no_infix),
            serde_json::Value::Object(map) => {
                assert_ne!(map.get("type"), Some(&serde_json::Value::String("infix".into())));
                map.values().for_each(assert_no_infix);
            }
            _ => {}
        }
    }
    for formula in [r"a \over b", r"{x \above{2pt} y} + {p \atop q}"] {
        let json = serde_json::to_value(parse(formula).expect("parse")).expect("serialize");
        assert_no_infix(&json);
    }
}

#[test]
fn strictness_is_configurable() {
    let mut strict = Settings::default();
    strict.strict = StrictMode::Error;
    assert!(parse_with_settings("é", &strict).is_err());
    assert!(parse("é").is_ok());

    let mut lenient = Settings::default();
    lenient.throw_on_error = false;
    lenient.error_color = "#00ff00".into();
    let nodes = parse_with_settings(r"\nope", &lenient).expect("fallback");
    match &nodes[0] {
        ParseNode::Color(color) => assert_eq!(color.color, "#00ff00"),
        other => panic!("expected color fallback, got {:?}", other),
    }
}

#[test]
fn global_group_keeps_macro_scope_open() {
    let mut settings = Settings::default();
    settings.global_group = true;
    settings.color_is_text_color = true;
    let nodes = parse_with_settings(r"\color{red}{x}", &settings).expect("parse");
    assert!(matches!(&nodes[0], ParseNode::Color(_)));
}
