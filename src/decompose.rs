//! Turning a mission into a sequence of sub-tasks, either by asking a language model
//! or from a hand-written script

use log::{debug, info, warn};

use crate::{
    error::{Error, Result},
    gpt::{chatgpt_system_message, ChatCompleter, Message},
    minigrid::{describe::env_to_str, describe::ObjectDescription, MiniGridEnv, ObjectKind},
    task::{GoToObjectTask, OpenDoorTask, PickUpObjectTask, Task},
    wrapper::TaskEnvWrapper,
};

/// Verbs the model may use, in the order they are matched
const VERBS: [&str; 3] = ["go to", "pick up", "open"];

/// Objects the model may refer to, in the order they are matched
const OBJECTS: [(&str, ObjectKind); 3] = [
    ("key", ObjectKind::Key),
    ("door", ObjectKind::Door),
    ("box", ObjectKind::Box),
];

/// The user prompt asking for a decomposition of the environment's mission
pub fn make_prompt(env: &MiniGridEnv) -> String {
    format!(
        "
You are controlling a simulated agent in a 2D grid to complete tasks.
Describe a sequence of intermediate objectives to complete the overall mission.
---
{}
---
Follow this template:

[Thought:  ${{description of reasoning process}}]
[repeat above any number of times needed...]

The objectives are:
<start of description>
[#. ${{short description of objective}}]
[repeat above any number of times needed...]
<end of description>
---

Rules:
1. Each objective should follow the template: ${{verb}} the ${{object}}
2. The allowed verbs are: \"go to\", \"pick up\", \"put down\", \"open\", \"close\"
3. The allowed objects are: \"box\", \"key\", \"door\", \"ball\", \"goal\", \"wall\", \"lava\"
4. Objects should be described only in terms of their types.
5. Do not include any information relating to color or coordinate.
",
        env_to_str(env)
    )
}

/// Extract the numbered objectives from a model reply
///
/// Every line starting with a digit counts; the number and one `.` or `)` are removed.
pub fn parse_task_descriptions(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .map(|line| {
            let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
            rest.strip_prefix(['.', ')']).unwrap_or(rest).trim().to_string()
        })
        .collect()
}

/// Read a nested decomposition such as `<task name="unlock"><task name="get key"/></task>`
///
/// Returns every element's `name` in document order together with its depth, the root at 0.
pub fn parse_decomposition_tree(xml: &str) -> Result<Vec<(usize, String)>> {
    fn walk(node: roxmltree::Node, depth: usize, out: &mut Vec<(usize, String)>) -> Result<()> {
        let name = node.attribute("name").ok_or_else(|| {
            Error::InvalidDecomposition(format!(
                "<{}> at depth {depth} has no name",
                node.tag_name().name()
            ))
        })?;
        out.push((depth, name.to_string()));
        for child in node.children().filter(roxmltree::Node::is_element) {
            walk(child, depth + 1, out)?;
        }
        Ok(())
    }

    let doc = roxmltree::Document::parse(xml)?;
    let mut tree = Vec::new();
    walk(doc.root_element(), 0, &mut tree)?;
    Ok(tree)
}

/// One line per sub-task, indented with `--` per level of depth
pub fn format_decomposition_tree(tree: &[(usize, String)]) -> String {
    tree.iter()
        .map(|(depth, name)| format!("{}{name}", "--".repeat(*depth)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build one task per description by keyword matching
///
/// Objects are matched by type only; the color is always `any`.
pub fn make_tasks(descriptions: &[String]) -> Result<Vec<Box<dyn Task>>> {
    descriptions
        .iter()
        .map(|desc| {
            let lower = desc.to_lowercase();
            let verb = VERBS
                .into_iter()
                .find(|v| lower.contains(v))
                .ok_or_else(|| Error::UnknownVerb(desc.clone()))?;
            let kind = OBJECTS
                .into_iter()
                .find(|(name, _)| lower.contains(name))
                .map(|(_, kind)| kind)
                .ok_or_else(|| Error::UnknownObject(desc.clone()))?;

            let object = ObjectDescription::of_kind(kind);
            let task: Box<dyn Task> = match verb {
                "go to" => Box::new(GoToObjectTask::new(object)),
                "pick up" => Box::new(PickUpObjectTask::new(object)),
                _ => Box::new(OpenDoorTask::new(object)),
            };
            Ok(task)
        })
        .collect()
}

/// Ask the model to decompose `env`'s mission and wrap `env` with the resulting tasks
///
/// The completer's history is replaced with the exchange: system message, prompt and reply.
pub fn make_automated_env(
    mut env: MiniGridEnv,
    completer: &mut ChatCompleter,
) -> Result<TaskEnvWrapper<MiniGridEnv>> {
    env.try_reset()?;

    completer.clear();
    completer.add_message(chatgpt_system_message());
    completer.add_message(Message::user(make_prompt(&env)));

    let reply = completer.generate_chat_completion()?;
    debug!("decomposition reply:\n{}", reply.content);
    let descriptions = parse_task_descriptions(&reply.content);
    completer.add_message(reply);

    if descriptions.is_empty() {
        warn!("no objectives found in the reply for {}", env.id());
    }
    let tasks = make_tasks(&descriptions)?;
    info!("{} decomposed into {:?}", env.id(), tasks);

    Ok(TaskEnvWrapper::with_fixed_tasks(env, tasks))
}

/// Wrap an unlock-and-pickup environment with a hand-written decomposition
///
/// Go to and pick up the key, go to and open the door, go to and pick up the box.
/// Objects missing from the layout are skipped.
pub fn make_wrapped_pickup_unlock_env(env: MiniGridEnv) -> TaskEnvWrapper<MiniGridEnv> {
    let make_tasks = |env: &MiniGridEnv| {
        let find = |kind: ObjectKind| {
            env.grid()
                .objects()
                .find(|(_, obj)| obj.kind() == kind)
                .map(|(_, obj)| ObjectDescription::new(obj.kind(), obj.color()))
        };

        let mut tasks: Vec<Box<dyn Task>> = Vec::with_capacity(6);
        match find(ObjectKind::Key) {
            Some(key) => {
                tasks.push(Box::new(GoToObjectTask::new(key)));
                tasks.push(Box::new(PickUpObjectTask::new(key)));
            }
            None => warn!("no key in the layout"),
        }
        match find(ObjectKind::Door) {
            Some(door) => {
                tasks.push(Box::new(GoToObjectTask::new(door)));
                tasks.push(Box::new(OpenDoorTask::new(door)));
            }
            None => warn!("no door in the layout"),
        }
        match find(ObjectKind::Box) {
            Some(target) => {
                tasks.push(Box::new(GoToObjectTask::new(target)));
                tasks.push(Box::new(PickUpObjectTask::new(target)));
            }
            None => warn!("no box in the layout"),
        }
        tasks
    };

    TaskEnvWrapper::new(env, Box::new(make_tasks))
}

#[cfg(test)]
mod tests {
    use crate::{
        env::Environment,
        gpt::{chat_completer::tests::ScriptedBackend, Role},
        minigrid::{Empty, MiniGridConfig, UnlockPickup},
    };

    use super::*;

    const REPLY: &str = "Thought: the box is behind a locked door, so I need the key first.

The objectives are:
<start of description>
1. Go to the key
2. Pick up the key
3. Go to the door
4. Open the door
5. Go to the box
6. Pick up the box
<end of description>";

    fn unlock_pickup(seed: u64) -> MiniGridEnv {
        MiniGridEnv::new(
            UnlockPickup::new(),
            MiniGridConfig {
                seed: Some(seed),
                ..Default::default()
            },
        )
    }

    #[test]
    fn prompt_contains_environment_and_rules() {
        let mut env = MiniGridEnv::new(Empty::new(5), MiniGridConfig::default());
        env.reset();
        let prompt = make_prompt(&env);

        assert!(prompt.contains("The environment consists of:"));
        assert!(prompt.contains("--green goal at (3, 3)"));
        assert!(prompt.contains("The overall mission is: get to the green goal square"));
        assert!(prompt.contains("<start of description>"));
        assert!(prompt.contains("[#. ${short description of objective}]"));
        assert!(prompt.contains("\"go to\", \"pick up\", \"put down\", \"open\", \"close\""));
    }

    #[test]
    fn parses_numbered_lines() {
        let descriptions = parse_task_descriptions(REPLY);
        assert_eq!(
            descriptions,
            vec![
                "Go to the key",
                "Pick up the key",
                "Go to the door",
                "Open the door",
                "Go to the box",
                "Pick up the box",
            ]
        );

        let odd = "10) open the door\n 2. indented lines are ignored\n3 go to the key";
        assert_eq!(parse_task_descriptions(odd), vec!["open the door", "go to the key"]);
        assert!(parse_task_descriptions("no numbered lines").is_empty());
    }

    #[test]
    fn strips_a_single_separator() {
        let reply = "4) .hidden door\n5.. go to the key";
        assert_eq!(parse_task_descriptions(reply), vec![".hidden door", ". go to the key"]);
    }

    #[test]
    fn reads_nested_decompositions() {
        let xml = r#"
<task name="pick up the box">
    <task name="unlock the door">
        <task name="go to the key"/>
        <task name="pick up the key"/>
        <task name="open the door"/>
    </task>
    <!-- the box is in the other room -->
    <task name="go to the box"/>
</task>"#;
        let tree = parse_decomposition_tree(xml).unwrap();
        assert_eq!(
            tree,
            vec![
                (0, String::from("pick up the box")),
                (1, String::from("unlock the door")),
                (2, String::from("go to the key")),
                (2, String::from("pick up the key")),
                (2, String::from("open the door")),
                (1, String::from("go to the box")),
            ]
        );
        assert_eq!(
            format_decomposition_tree(&tree),
            "pick up the box\n--unlock the door\n----go to the key\n----pick up the key\n\
             ----open the door\n--go to the box"
        );
    }

    #[test]
    fn rejects_bad_decompositions() {
        let unnamed = r#"<task name="root"><step/></task>"#;
        match parse_decomposition_tree(unnamed) {
            Err(Error::InvalidDecomposition(msg)) => assert!(msg.contains("<step>"), "{msg}"),
            other => panic!("expected a missing name error, got {other:?}"),
        }
        assert!(matches!(
            parse_decomposition_tree("<task name=\"root\">"),
            Err(Error::Xml(_))
        ));
    }

    #[test]
    fn makes_tasks_from_keywords() {
        let tasks = make_tasks(&parse_task_descriptions(REPLY)).unwrap();
        let names: Vec<_> = tasks.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "go to the key",
                "pick up the key",
                "go to the door",
                "open the door",
                "go to the box",
                "pick up the box",
            ]
        );
    }

    #[test]
    fn verb_and_object_precedence() {
        let tasks = make_tasks(&["Open the box with the key".to_string()]).unwrap();
        assert_eq!(tasks[0].to_string(), "open the key", "key is checked before box");
    }

    #[test]
    fn unknown_words_are_errors() {
        assert!(matches!(
            make_tasks(&["Close the door".to_string()]),
            Err(Error::UnknownVerb(_))
        ));
        assert!(matches!(
            make_tasks(&["Go to the ball".to_string()]),
            Err(Error::UnknownObject(_))
        ));
    }

    #[test]
    fn automated_env_asks_the_model_once() {
        let backend = ScriptedBackend::with_replies(&[REPLY]);
        let mut completer = ChatCompleter::new(backend.clone(), Default::default());
        let mut env = make_automated_env(unlock_pickup(3), &mut completer).unwrap();

        let history = completer.chat_history();
        assert_eq!(history.len(), 3, "System, prompt and reply");
        assert_eq!(history[0], chatgpt_system_message());
        assert_eq!(history[1].role, Role::User);
        assert!(history[1].content.contains("The overall mission is: pick up the"));
        assert_eq!(history[2].role, Role::Assistant);
        assert_eq!(backend.requests.borrow().len(), 1);

        let obs = env.reset();
        assert_eq!(obs.mission, "go to the key");
        assert_eq!(env.tasks().len(), 6);
        assert!(env.overall_mission().starts_with("pick up the"));

        env.reset();
        assert_eq!(backend.requests.borrow().len(), 1, "Resets reuse the decomposition");
    }

    #[test]
    fn automated_env_surfaces_parse_errors() {
        let backend = ScriptedBackend::with_replies(&["1. Dance with the ball"]);
        let mut completer = ChatCompleter::new(backend, Default::default());
        assert!(make_automated_env(unlock_pickup(0), &mut completer).is_err());
    }

    #[test]
    fn scripted_decomposition_uses_layout_colors() {
        let mut env = make_wrapped_pickup_unlock_env(unlock_pickup(7));
        env.reset();

        let grid = env.inner().grid();
        let color_of = |kind| {
            grid.objects()
                .find(|(_, o)| o.kind() == kind)
                .map(|(_, o)| o.color())
                .unwrap()
        };
        let key = color_of(ObjectKind::Key);
        let door = color_of(ObjectKind::Door);
        let target = color_of(ObjectKind::Box);

        let names: Vec<_> = env.tasks().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                format!("go to the {key} key"),
                format!("pick up the {key} key"),
                format!("go to the {door} door"),
                format!("open the {door} door"),
                format!("go to the {target} box"),
                format!("pick up the {target} box"),
            ]
        );
        assert_eq!(key, door, "Key matches the door");
    }
}
